mod draft;
mod patch;

pub use draft::IssueDraft;
pub(crate) use draft::require_text;
pub use patch::{CommentInput, IssuePatch};

use serde::Serialize;

use crate::domains::issues::models::{Issue, IssueAssignmentRecord, IssueComment, IssuePhoto};

/// An issue with its comment thread, photos and assignment history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDetail {
    pub issue: Issue,
    pub comments: Vec<IssueComment>,
    pub photos: Vec<IssuePhoto>,
    pub assignments: Vec<IssueAssignmentRecord>,
}
