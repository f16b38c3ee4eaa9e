use sqlx::PgConnection;
use tracing::info;

use super::events::publish_comment_added;
use crate::common::{CivicResult, IssueId, OutboxId, UserId};
use crate::domains::issues::data::require_text;
use crate::domains::issues::models::{Issue, IssueComment};
use crate::domains::notifications::activities::{dispatch_after_commit, enqueue};
use crate::domains::notifications::{NotificationEvent, NotificationType};
use crate::kernel::ServerDeps;

/// Append a comment to an issue.
pub async fn add_comment(
    issue_id: IssueId,
    author_id: Option<UserId>,
    content: String,
    is_internal: bool,
    deps: &ServerDeps,
) -> CivicResult<IssueComment> {
    require_text("content", &content)?;

    let mut tx = deps.db_pool.begin().await?;
    let issue = Issue::lock(issue_id, &mut *tx).await?;
    let (comment, outbox_id) =
        append_comment(&issue, author_id, content, is_internal, deps, &mut *tx).await?;
    tx.commit().await?;

    info!(
        issue_id = %issue_id,
        comment_id = %comment.id,
        is_internal,
        "Comment added"
    );

    dispatch_after_commit(outbox_id.into_iter().collect(), deps).await;
    publish_comment_added(&comment, &deps.stream_hub).await;
    Ok(comment)
}

/// Write a comment inside a transaction that already holds the issue lock.
///
/// Public comments bump `comment_count`, and notify the reporter unless the
/// reporter wrote it.
pub(super) async fn append_comment(
    issue: &Issue,
    author_id: Option<UserId>,
    content: String,
    is_internal: bool,
    deps: &ServerDeps,
    conn: &mut PgConnection,
) -> CivicResult<(IssueComment, Option<OutboxId>)> {
    let now = deps.clock.now();
    let comment = IssueComment::comment(
        issue.id,
        author_id,
        content.trim().to_string(),
        is_internal,
        now,
    )
    .insert(conn)
    .await?;

    if is_internal {
        return Ok((comment, None));
    }

    Issue::increment_comment_count(issue.id, now, conn).await?;

    let outbox_id = match issue.reporter() {
        Some(reporter) if author_id != Some(reporter) => Some(
            enqueue(
                &NotificationEvent::to_user(
                    reporter,
                    NotificationType::Comment,
                    Some(issue.id),
                    "New Comment",
                    format!("Someone commented on your issue \"{}\"", issue.title),
                ),
                deps,
                conn,
            )
            .await?,
        ),
        _ => None,
    };

    Ok((comment, outbox_id))
}
