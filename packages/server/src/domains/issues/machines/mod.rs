//! Issue lifecycle state machine
//!
//! Pure decision logic - NO IO, only the transition table.
//!
//! ```text
//! submitted    → acknowledged, assigned
//! acknowledged → assigned, in_progress
//! assigned     → in_progress
//! in_progress  → resolved
//! resolved     → closed
//! closed       (terminal)
//! ```
//!
//! `resolved` only leads to `closed`, and nothing leaves `closed`; there is no
//! reopen path.

use crate::common::{CivicError, CivicResult};
use crate::domains::issues::models::IssueStatus;

/// Outcome of an accepted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: IssueStatus,
    pub to: IssueStatus,
}

impl Transition {
    /// Entering `resolved` is what stamps `resolved_at`.
    pub fn stamps_resolved_at(&self) -> bool {
        self.to == IssueStatus::Resolved
    }
}

/// Statuses reachable in one step from `from`.
pub fn allowed_targets(from: IssueStatus) -> &'static [IssueStatus] {
    use IssueStatus::*;

    match from {
        Submitted => &[Acknowledged, Assigned],
        Acknowledged => &[Assigned, InProgress],
        Assigned => &[InProgress],
        InProgress => &[Resolved],
        Resolved => &[Closed],
        Closed => &[],
    }
}

/// Validate `from → to` against the table.
pub fn decide(from: IssueStatus, to: IssueStatus) -> CivicResult<Transition> {
    if allowed_targets(from).contains(&to) {
        Ok(Transition { from, to })
    } else {
        Err(CivicError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use IssueStatus::*;

    const ALL: [IssueStatus; 6] = [Submitted, Acknowledged, Assigned, InProgress, Resolved, Closed];

    #[test]
    fn full_happy_path_is_accepted() {
        let path = [Submitted, Acknowledged, Assigned, InProgress, Resolved, Closed];
        for pair in path.windows(2) {
            assert!(decide(pair[0], pair[1]).is_ok(), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn submitted_cannot_jump_to_resolved() {
        let err = decide(Submitted, Resolved).unwrap_err();
        assert!(matches!(
            err,
            CivicError::InvalidTransition {
                from: Submitted,
                to: Resolved
            }
        ));
    }

    #[test]
    fn resolved_only_moves_to_closed() {
        for to in ALL {
            assert_eq!(decide(Resolved, to).is_ok(), to == Closed, "resolved -> {}", to);
        }
    }

    #[test]
    fn closed_is_terminal() {
        for to in ALL {
            assert!(decide(Closed, to).is_err(), "closed -> {}", to);
        }
    }

    #[test]
    fn self_transitions_are_rejected() {
        for status in ALL {
            assert!(decide(status, status).is_err(), "{} -> {}", status, status);
        }
    }

    #[test]
    fn table_has_exactly_eight_edges() {
        let edges: usize = ALL.iter().map(|s| allowed_targets(*s).len()).sum();
        assert_eq!(edges, 8);
    }

    #[test]
    fn only_entering_resolved_stamps_resolved_at() {
        assert!(decide(InProgress, Resolved).unwrap().stamps_resolved_at());
        assert!(!decide(Resolved, Closed).unwrap().stamps_resolved_at());
        assert!(!decide(Submitted, Assigned).unwrap().stamps_resolved_at());
    }
}
