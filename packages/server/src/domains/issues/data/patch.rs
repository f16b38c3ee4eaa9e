use serde::{Deserialize, Serialize};

use crate::common::UserId;
use crate::domains::issues::models::{IssuePriority, IssueStatus};

/// Requested changes to an issue. Every field is optional; unset fields are
/// left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IssuePatch {
    /// Target status; validated against the transition table.
    pub status: Option<IssueStatus>,
    /// Status the caller believes the issue is in. A stale value rejects the
    /// transition instead of applying it to a state the caller never saw.
    pub expected_status: Option<IssueStatus>,
    /// Text for the transition's audit entry.
    pub note: Option<String>,
    pub priority: Option<IssuePriority>,
    pub department_id: Option<String>,
    pub assigned_staff: Option<UserId>,
    pub comment: Option<CommentInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommentInput {
    pub content: String,
    #[serde(default)]
    pub is_internal: bool,
}

impl IssuePatch {
    pub fn status(status: IssueStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.department_id.is_none()
            && self.assigned_staff.is_none()
            && self.comment.is_none()
    }

    /// Whether applying the patch needs a staff role.
    pub fn touches_workflow(&self) -> bool {
        self.status.is_some()
            || self.priority.is_some()
            || self.department_id.is_some()
            || self.assigned_staff.is_some()
            || self.comment.as_ref().is_some_and(|c| c.is_internal)
    }
}
