//! Test fixtures for creating test data.
//!
//! Fixtures go through the same activities production code uses.

use anyhow::Result;
use civic_core::common::{IssueCategory, Location, UserId};
use civic_core::domains::departments::DepartmentStaff;
use civic_core::domains::issues::activities::{create_issue, update_issue};
use civic_core::domains::issues::{Issue, IssueDraft, IssuePatch, IssueStatus};
use civic_core::kernel::ServerDeps;

/// Draft for a signed-in citizen.
pub fn draft(category: IssueCategory, reporter: UserId) -> IssueDraft {
    IssueDraft::builder()
        .title(format!("Test {} report", category))
        .description("Reported from an integration test")
        .category(category)
        .location(Location::address("100 Main St"))
        .reported_by(reporter)
        .build()
}

/// Submit a pothole report from a fresh citizen.
pub async fn report_pothole(deps: &ServerDeps) -> Result<(Issue, UserId)> {
    let reporter = UserId::new();
    let issue = create_issue(draft(IssueCategory::Potholes, reporter), deps).await?;
    Ok((issue, reporter))
}

/// Walk an issue through consecutive status changes, as `actor`.
pub async fn advance_through(
    issue: &Issue,
    statuses: &[IssueStatus],
    actor: UserId,
    deps: &ServerDeps,
) -> Result<Issue> {
    let mut current = issue.clone();
    for status in statuses {
        current = update_issue(current.id, IssuePatch::status(*status), Some(actor), deps).await?;
    }
    Ok(current)
}

/// Add a fresh staff member to a department's pool.
pub async fn add_staff(department_id: &str, deps: &ServerDeps) -> Result<UserId> {
    let staff = UserId::new();
    DepartmentStaff::add(department_id, staff, &deps.db_pool).await?;
    Ok(staff)
}
