//! Live events on `issue:{id}` topics.

use serde_json::json;

use crate::domains::issues::models::{Issue, IssueComment};
use crate::kernel::{StreamHub, Topic};

/// Topics are public, so an anonymous reporter is never included.
pub async fn publish_issue_updated(issue: &Issue, hub: &StreamHub) {
    let mut issue = issue.clone();
    if issue.is_anonymous {
        issue.reported_by = None;
    }
    hub.publish(
        &Topic::Issue(issue.id),
        json!({ "type": "issue_updated", "issue": issue }),
    )
    .await;
}

/// Internal comments are never broadcast.
pub async fn publish_comment_added(comment: &IssueComment, hub: &StreamHub) {
    if comment.is_internal {
        return;
    }
    hub.publish(
        &Topic::Issue(comment.issue_id),
        json!({ "type": "comment_added", "comment": comment }),
    )
    .await;
}
