pub mod activities;
pub mod data;
pub mod machines;
pub mod models;

pub use data::{CommentInput, IssueDetail, IssueDraft, IssuePatch};
pub use models::{Issue, IssueComment, IssueFilter, IssuePriority, IssueStatus};
