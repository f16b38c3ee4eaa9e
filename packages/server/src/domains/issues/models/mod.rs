pub mod assignment;
pub mod comment;
pub mod issue;
pub mod photo;

pub use assignment::IssueAssignmentRecord;
pub use comment::IssueComment;
pub use issue::{Issue, IssueFilter, IssuePriority, IssueStatus};
pub use photo::IssuePhoto;
