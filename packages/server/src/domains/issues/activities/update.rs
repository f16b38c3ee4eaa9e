use tracing::{debug, info, warn};

use super::comments::append_comment;
use super::events::{publish_comment_added, publish_issue_updated};
use crate::common::{CivicError, CivicResult, IssueId, UserId};
use crate::domains::issues::data::{require_text, IssuePatch};
use crate::domains::issues::machines;
use crate::domains::issues::models::{Issue, IssueAssignmentRecord, IssueComment, IssueStatus};
use crate::domains::notifications::activities::{dispatch_after_commit, enqueue};
use crate::domains::notifications::{NotificationEvent, NotificationType};
use crate::kernel::ServerDeps;

/// Apply a patch to an issue.
///
/// Runs in one transaction holding the issue row lock, so concurrent updates
/// on the same issue are serialized and each transition is validated against
/// the status committed by whoever went before. A rejected transition leaves
/// the issue untouched: nothing in the patch is applied.
pub async fn update_issue(
    issue_id: IssueId,
    patch: IssuePatch,
    actor: Option<UserId>,
    deps: &ServerDeps,
) -> CivicResult<Issue> {
    let now = deps.clock.now();
    let mut tx = deps.db_pool.begin().await?;
    let mut issue = Issue::lock(issue_id, &mut *tx).await?;

    if patch.is_empty() {
        debug!(issue_id = %issue_id, "Empty patch, nothing to apply");
        return Ok(issue);
    }

    let mut outbox = Vec::new();
    let mut changed = false;

    if let Some(target) = patch.status {
        if let Some(expected) = patch.expected_status {
            if expected != issue.status {
                warn!(
                    issue_id = %issue_id,
                    expected = %expected,
                    current = %issue.status,
                    "Stale expected status, rejecting transition"
                );
                return Err(CivicError::InvalidTransition {
                    from: issue.status,
                    to: target,
                });
            }
        }

        let transition = machines::decide(issue.status, target).inspect_err(|_| {
            warn!(
                issue_id = %issue_id,
                from = %issue.status,
                to = %target,
                "Rejected status transition"
            );
        })?;

        let resolved_at = transition.stamps_resolved_at().then_some(now);
        issue = Issue::apply_status(issue_id, transition.to, resolved_at, now, &mut *tx).await?;

        IssueComment::status_change(
            issue_id,
            actor,
            transition.from,
            transition.to,
            patch.note.clone(),
            now,
        )
        .insert(&mut *tx)
        .await?;

        if let Some(reporter) = issue.reporter() {
            let event = if transition.to == IssueStatus::Resolved {
                NotificationEvent::to_user(
                    reporter,
                    NotificationType::Resolved,
                    Some(issue_id),
                    "Issue Resolved",
                    format!("Your issue \"{}\" has been resolved", issue.title),
                )
            } else {
                NotificationEvent::to_user(
                    reporter,
                    NotificationType::IssueUpdate,
                    Some(issue_id),
                    "Issue Status Updated",
                    format!(
                        "Your issue \"{}\" is now {}",
                        issue.title,
                        transition.to.label()
                    ),
                )
            };
            outbox.push(enqueue(&event, deps, &mut *tx).await?);
        }

        info!(
            issue_id = %issue_id,
            from = %transition.from,
            to = %transition.to,
            "Issue status changed"
        );
        changed = true;
    }

    if let Some(priority) = patch.priority {
        if priority != issue.priority {
            issue = Issue::set_priority(issue_id, priority, now, &mut *tx).await?;
            changed = true;
        }
    }

    if let Some(department_id) = patch.department_id.as_deref() {
        if department_id != issue.assigned_department {
            let department = deps.catalog.require(department_id)?;
            issue = Issue::set_department(issue_id, &department.id, now, &mut *tx).await?;
            IssueAssignmentRecord::record(
                issue_id,
                &department.id,
                issue.assigned_staff,
                actor,
                patch.note.as_deref(),
                now,
                &mut *tx,
            )
            .await?;
            outbox.push(
                enqueue(
                    &NotificationEvent::to_department(
                        department.id.clone(),
                        NotificationType::Assignment,
                        Some(issue_id),
                        "New Issue Assigned",
                        format!("\"{}\" has been assigned to {}", issue.title, department.name),
                    ),
                    deps,
                    &mut *tx,
                )
                .await?,
            );
            info!(issue_id = %issue_id, department = %department.id, "Issue reassigned");
            changed = true;
        }
    }

    if let Some(staff) = patch.assigned_staff {
        if issue.assigned_staff != Some(staff) {
            issue = Issue::set_staff(issue_id, Some(staff), now, &mut *tx).await?;
            IssueAssignmentRecord::record(
                issue_id,
                &issue.assigned_department,
                Some(staff),
                actor,
                patch.note.as_deref(),
                now,
                &mut *tx,
            )
            .await?;
            outbox.push(
                enqueue(
                    &NotificationEvent::to_user(
                        staff,
                        NotificationType::Assignment,
                        Some(issue_id),
                        "Issue Assigned to You",
                        format!("You have been assigned \"{}\"", issue.title),
                    ),
                    deps,
                    &mut *tx,
                )
                .await?,
            );
            info!(issue_id = %issue_id, staff = %staff, "Staff assigned");
            changed = true;
        }
    }

    let mut new_comment = None;
    if let Some(input) = patch.comment {
        require_text("comment", &input.content)?;
        let (comment, outbox_id) =
            append_comment(&issue, actor, input.content, input.is_internal, deps, &mut *tx).await?;
        outbox.extend(outbox_id);
        new_comment = Some(comment);
        changed = true;
    }

    // Counters moved by the comment; re-read so the caller sees them.
    if new_comment.is_some() {
        issue = Issue::lock(issue_id, &mut *tx).await?;
    }

    tx.commit().await?;

    dispatch_after_commit(outbox, deps).await;
    if changed {
        publish_issue_updated(&issue, &deps.stream_hub).await;
    }
    if let Some(comment) = &new_comment {
        publish_comment_added(comment, &deps.stream_hub).await;
    }
    debug!(issue_id = %issue_id, changed, "Issue update committed");

    Ok(issue)
}
