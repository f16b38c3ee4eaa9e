use tracing::info;

use crate::common::{CivicResult, IssueId};
use crate::domains::departments::route;
use crate::domains::issues::data::IssueDraft;
use crate::domains::issues::models::{Issue, IssueAssignmentRecord, IssueStatus};
use crate::domains::notifications::activities::{dispatch_after_commit, enqueue};
use crate::domains::notifications::{NotificationEvent, NotificationType};
use crate::kernel::ServerDeps;

/// Submit a new issue.
///
/// Routes it to a department, persists the issue together with its first
/// assignment record and the department-pool notification, then delivers the
/// notification once the transaction has committed.
pub async fn create_issue(draft: IssueDraft, deps: &ServerDeps) -> CivicResult<Issue> {
    draft.validate()?;

    let department = route(&deps.catalog, draft.category, Some(&draft.location));
    let now = deps.clock.now();

    let issue = Issue {
        id: IssueId::new(),
        title: draft.title.trim().to_string(),
        description: draft.description.trim().to_string(),
        category: draft.category,
        priority: draft.priority,
        status: IssueStatus::Submitted,
        location: draft.location,
        reported_by: draft.reported_by,
        assigned_department: department.id.clone(),
        assigned_staff: None,
        upvote_count: 0,
        comment_count: 0,
        is_anonymous: draft.is_anonymous,
        created_at: now,
        updated_at: now,
        resolved_at: None,
    };

    let mut tx = deps.db_pool.begin().await?;
    let issue = issue.insert(&mut *tx).await?;
    IssueAssignmentRecord::record(
        issue.id,
        &department.id,
        None,
        issue.reported_by,
        Some("Routed by category"),
        now,
        &mut *tx,
    )
    .await?;
    let outbox_id = enqueue(
        &NotificationEvent::to_department(
            department.id.clone(),
            NotificationType::Assignment,
            Some(issue.id),
            "New Issue Assigned",
            format!("\"{}\" has been assigned to {}", issue.title, department.name),
        ),
        deps,
        &mut *tx,
    )
    .await?;
    tx.commit().await?;

    info!(
        issue_id = %issue.id,
        category = %issue.category,
        department = %issue.assigned_department,
        "Issue created"
    );

    dispatch_after_commit(vec![outbox_id], deps).await;
    Ok(issue)
}
