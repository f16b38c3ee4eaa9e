//! Typed ID definitions for all domain entities.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for Issue entities (reported civic problems).
pub struct Issue;

/// Marker type for users supplied by the identity provider.
pub struct User;

/// Marker type for IssueComment entities (comments and status audit entries).
pub struct IssueComment;

/// Marker type for IssuePhoto entities.
pub struct IssuePhoto;

/// Marker type for IssueAssignment entities (assignment history).
pub struct IssueAssignment;

/// Marker type for Upvote entities.
pub struct Upvote;

/// Marker type for Notification entities.
pub struct Notification;

/// Marker type for pending notification outbox entries.
pub struct OutboxEntry;

/// Marker type for AnalyticsSnapshot entities.
pub struct AnalyticsSnapshot;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type IssueId = Id<Issue>;

pub type UserId = Id<User>;

pub type CommentId = Id<IssueComment>;

pub type PhotoId = Id<IssuePhoto>;

pub type AssignmentId = Id<IssueAssignment>;

pub type UpvoteId = Id<Upvote>;

pub type NotificationId = Id<Notification>;

pub type OutboxId = Id<OutboxEntry>;

pub type SnapshotId = Id<AnalyticsSnapshot>;
