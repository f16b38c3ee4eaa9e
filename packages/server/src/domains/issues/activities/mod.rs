//! Issue actions - the IssueStore operations.
//!
//! Every mutation runs in one transaction; notifications are queued in the
//! same transaction and delivered after it commits.

mod comments;
mod create;
mod events;
mod photos;
mod queries;
mod update;

pub use comments::add_comment;
pub use create::create_issue;
pub use events::{publish_comment_added, publish_issue_updated};
pub use photos::attach_photo;
pub use queries::{get_issue, get_issue_detail, list_comments, list_issues};
pub use update::update_issue;
