//! Notification production through the outbox.
//!
//! Mutating activities write `OutboxEntry` rows inside their own transaction
//! and hand the ids to `dispatch_after_commit`. Delivery then expands the
//! audience, writes one `Notification` per recipient and deletes the entry in
//! a single transaction, so each event is persisted exactly once. Entries left
//! behind by a crash are picked up by `sweep`.

use std::time::Duration;

use serde_json::json;
use sqlx::PgConnection;
use tracing::{debug, error, info, warn};

use crate::common::{CivicResult, NotificationId, OutboxId};
use crate::domains::departments::DepartmentStaff;
use crate::domains::notifications::models::{
    Audience, Notification, NotificationEvent, OutboxEntry,
};
use crate::kernel::{DeliveryMode, ServerDeps, StreamHub, Topic};

/// Entries drained per sweep transaction.
pub const SWEEP_BATCH_SIZE: i64 = 100;

/// Record an event inside the caller's transaction.
pub async fn enqueue(
    event: &NotificationEvent,
    deps: &ServerDeps,
    conn: &mut PgConnection,
) -> CivicResult<OutboxId> {
    OutboxEntry::enqueue(event, deps.clock.now(), conn).await
}

/// Produce notifications for a standalone event.
pub async fn notify(event: NotificationEvent, deps: &ServerDeps) -> CivicResult<()> {
    let mut tx = deps.db_pool.begin().await?;
    let id = enqueue(&event, deps, &mut *tx).await?;
    tx.commit().await?;

    dispatch_after_commit(vec![id], deps).await;
    Ok(())
}

/// Deliver entries whose triggering transaction has committed.
///
/// Failures are logged, never returned: the primary write already happened and
/// the sweep retries whatever is still in the outbox.
pub async fn dispatch_after_commit(ids: Vec<OutboxId>, deps: &ServerDeps) {
    if ids.is_empty() {
        return;
    }

    match deps.delivery_mode {
        DeliveryMode::Inline => {
            if let Err(e) = deliver(&ids, deps).await {
                error!(error = %e, entries = ids.len(), "Notification delivery failed");
            }
        }
        DeliveryMode::Spawned => {
            let deps = deps.clone();
            tokio::spawn(async move {
                if let Err(e) = deliver(&ids, &deps).await {
                    error!(error = %e, entries = ids.len(), "Notification delivery failed");
                }
            });
        }
    }
}

/// Deliver specific outbox entries. Entries another deliverer already handled
/// are skipped.
pub async fn deliver(ids: &[OutboxId], deps: &ServerDeps) -> CivicResult<Vec<Notification>> {
    let mut tx = deps.db_pool.begin().await?;
    let entries = OutboxEntry::claim(ids, &mut *tx).await?;

    let mut created = Vec::new();
    for entry in &entries {
        created.extend(fan_out(entry, &mut *tx).await?);
    }
    tx.commit().await?;

    debug!(
        entries = entries.len(),
        notifications = created.len(),
        "Delivered outbox entries"
    );
    publish_created(&created, &deps.stream_hub).await;
    Ok(created)
}

/// Drain one batch of undelivered entries. Returns how many were delivered.
pub async fn sweep(deps: &ServerDeps) -> CivicResult<usize> {
    let mut tx = deps.db_pool.begin().await?;
    let entries = OutboxEntry::claim_batch(SWEEP_BATCH_SIZE, &mut *tx).await?;
    if entries.is_empty() {
        return Ok(0);
    }

    let mut created = Vec::new();
    for entry in &entries {
        created.extend(fan_out(entry, &mut *tx).await?);
    }
    tx.commit().await?;

    info!(
        entries = entries.len(),
        notifications = created.len(),
        "Outbox sweep delivered pending entries"
    );
    publish_created(&created, &deps.stream_hub).await;
    Ok(entries.len())
}

/// Background loop that keeps the outbox drained.
pub async fn run_outbox_sweeper(deps: ServerDeps, poll_interval: Duration) {
    info!(interval_secs = poll_interval.as_secs(), "Outbox sweeper started");
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        loop {
            match sweep(&deps).await {
                Ok(n) if n as i64 == SWEEP_BATCH_SIZE => continue,
                Ok(_) => break,
                Err(e) => {
                    error!(error = %e, "Outbox sweep failed");
                    break;
                }
            }
        }
        deps.stream_hub.cleanup().await;
    }
}

async fn fan_out(entry: &OutboxEntry, conn: &mut PgConnection) -> CivicResult<Vec<Notification>> {
    let recipients = match entry.audience()? {
        Audience::User(user_id) => vec![user_id],
        Audience::Department(department_id) => {
            let pool = DepartmentStaff::user_ids_for(&department_id, conn).await?;
            if pool.is_empty() {
                warn!(
                    department = %department_id,
                    outbox_id = %entry.id,
                    "Department has no staff to notify"
                );
            }
            pool
        }
    };

    let mut created = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        let notification = Notification {
            id: NotificationId::new(),
            recipient_user_id: recipient,
            kind: entry.kind,
            related_issue_id: entry.issue_id,
            title: entry.title.clone(),
            message: entry.message.clone(),
            is_read: false,
            created_at: entry.created_at,
        }
        .insert(conn)
        .await?;
        created.push(notification);
    }

    OutboxEntry::delete(entry.id, conn).await?;
    Ok(created)
}

async fn publish_created(created: &[Notification], hub: &StreamHub) {
    for notification in created {
        hub.publish(
            &Topic::User(notification.recipient_user_id),
            json!({
                "type": "notification_created",
                "notification": notification,
            }),
        )
        .await;
    }
}
