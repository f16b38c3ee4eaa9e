//! Role checks for the HTTP surface.
//!
//! The identity provider decides who someone is; this decides what their role
//! lets them do. Denials surface as `CivicError::Permission`.

use crate::common::{CivicError, CivicResult, UserId};
use crate::domains::issues::{Issue, IssuePatch};
use crate::server::middleware::AuthUser;

pub struct AccessPolicy;

impl AccessPolicy {
    pub fn require_user(user: Option<&AuthUser>) -> CivicResult<&AuthUser> {
        user.ok_or_else(|| CivicError::Permission("authentication required".into()))
    }

    pub fn can_view_internal(user: Option<&AuthUser>) -> bool {
        user.is_some_and(|u| u.role.is_staff())
    }

    /// Status, priority, reassignment and internal comments are staff-only.
    /// Anyone signed in may add a public comment through a patch.
    pub fn check_patch(user: Option<&AuthUser>, patch: &IssuePatch) -> CivicResult<()> {
        if !patch.touches_workflow() {
            return Ok(());
        }
        match user {
            Some(u) if u.role.is_staff() => Ok(()),
            Some(_) => Err(CivicError::Permission(
                "staff role required to change issue workflow".into(),
            )),
            None => Err(CivicError::Permission("authentication required".into())),
        }
    }

    pub fn check_internal_comment(user: Option<&AuthUser>, is_internal: bool) -> CivicResult<()> {
        if is_internal && !Self::can_view_internal(user) {
            return Err(CivicError::Permission(
                "staff role required for internal comments".into(),
            ));
        }
        Ok(())
    }

    /// Subscribers to a `user:` topic must be that user.
    pub fn check_user_topic(user: Option<&AuthUser>, topic_user: UserId) -> CivicResult<()> {
        match user {
            Some(u) if u.user_id == topic_user => Ok(()),
            Some(_) => Err(CivicError::Permission(
                "cannot subscribe to another user's notifications".into(),
            )),
            None => Err(CivicError::Permission("authentication required".into())),
        }
    }

    /// Hide the reporter of an anonymous issue from everyone but staff and
    /// the reporter.
    pub fn redact(user: Option<&AuthUser>, mut issue: Issue) -> Issue {
        let privileged =
            user.is_some_and(|u| u.role.is_staff() || Some(u.user_id) == issue.reported_by);
        if issue.is_anonymous && !privileged {
            issue.reported_by = None;
        }
        issue
    }
}
