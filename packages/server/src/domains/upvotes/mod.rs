pub mod activities;
pub mod models;

pub use activities::{UpvoteAction, UpvoteToggle};
pub use models::Upvote;
