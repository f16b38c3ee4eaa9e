mod toggle;

pub use toggle::{toggle_upvote, UpvoteAction, UpvoteToggle};
