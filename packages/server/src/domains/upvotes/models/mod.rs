pub mod upvote;

pub use upvote::Upvote;
