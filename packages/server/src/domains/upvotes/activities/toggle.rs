use serde::{Deserialize, Serialize};
use tracing::info;

use crate::common::{CivicError, CivicResult, IssueId, UserId};
use crate::domains::issues::activities::publish_issue_updated;
use crate::domains::issues::models::Issue;
use crate::domains::notifications::activities::{dispatch_after_commit, enqueue};
use crate::domains::notifications::{NotificationEvent, NotificationType};
use crate::domains::upvotes::models::Upvote;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpvoteAction {
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpvoteToggle {
    pub action: UpvoteAction,
    pub count: i32,
}

/// Flip a user's vote on an issue.
///
/// Existence check, row change and counter update happen in one transaction
/// that holds the issue lock, so concurrent toggles from the same user take
/// turns and each sees the other's committed result.
pub async fn toggle_upvote(
    issue_id: IssueId,
    user_id: UserId,
    deps: &ServerDeps,
) -> CivicResult<UpvoteToggle> {
    let now = deps.clock.now();
    let mut tx = deps.db_pool.begin().await?;
    Issue::lock(issue_id, &mut *tx).await?;

    let (action, issue) = if Upvote::remove(issue_id, user_id, &mut *tx).await?.is_some() {
        let issue = Upvote::adjust_issue_counter(issue_id, -1, now, &mut *tx).await?;
        (UpvoteAction::Removed, issue)
    } else {
        Upvote::insert(issue_id, user_id, now, &mut *tx)
            .await?
            .ok_or_else(|| {
                CivicError::Conflict(format!(
                    "concurrent upvote on issue {} by user {}",
                    issue_id, user_id
                ))
            })?;
        let issue = Upvote::adjust_issue_counter(issue_id, 1, now, &mut *tx).await?;
        (UpvoteAction::Added, issue)
    };

    let mut outbox = Vec::new();
    if action == UpvoteAction::Added {
        if let Some(reporter) = issue.reporter() {
            outbox.push(
                enqueue(
                    &NotificationEvent::to_user(
                        reporter,
                        NotificationType::Upvote,
                        Some(issue_id),
                        "New Upvote",
                        format!("Someone upvoted your issue \"{}\"", issue.title),
                    ),
                    deps,
                    &mut *tx,
                )
                .await?,
            );
        }
    }
    tx.commit().await?;

    info!(
        issue_id = %issue_id,
        user_id = %user_id,
        action = ?action,
        count = issue.upvote_count,
        "Upvote toggled"
    );

    dispatch_after_commit(outbox, deps).await;
    publish_issue_updated(&issue, &deps.stream_hub).await;

    Ok(UpvoteToggle {
        action,
        count: issue.upvote_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_result_serializes_lowercase_action() {
        let json = serde_json::to_value(UpvoteToggle {
            action: UpvoteAction::Removed,
            count: 3,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"action": "removed", "count": 3}));
    }
}
