use tracing::debug;

use crate::common::{CivicError, CivicResult, IssueId};
use crate::domains::issues::data::IssueDetail;
use crate::domains::issues::models::{
    Issue, IssueAssignmentRecord, IssueComment, IssueFilter, IssuePhoto,
};
use crate::kernel::ServerDeps;

pub async fn get_issue(issue_id: IssueId, deps: &ServerDeps) -> CivicResult<Issue> {
    Issue::require(issue_id, &deps.db_pool).await
}

/// Newest first. No limit unless the caller asks for one.
pub async fn list_issues(
    filter: &IssueFilter,
    limit: Option<i64>,
    deps: &ServerDeps,
) -> CivicResult<Vec<Issue>> {
    if let Some(limit) = limit.filter(|limit| *limit < 0) {
        return Err(CivicError::Validation(format!(
            "limit must not be negative, got {}",
            limit
        )));
    }

    let issues = Issue::list(filter, limit, &deps.db_pool).await?;
    debug!(count = issues.len(), ?filter, "Listed issues");
    Ok(issues)
}

pub async fn get_issue_detail(
    issue_id: IssueId,
    include_internal: bool,
    deps: &ServerDeps,
) -> CivicResult<IssueDetail> {
    let issue = Issue::require(issue_id, &deps.db_pool).await?;
    let (comments, photos, assignments) = tokio::try_join!(
        IssueComment::find_for_issue(issue_id, include_internal, &deps.db_pool),
        IssuePhoto::find_for_issue(issue_id, &deps.db_pool),
        IssueAssignmentRecord::find_for_issue(issue_id, &deps.db_pool),
    )?;

    Ok(IssueDetail {
        issue,
        comments,
        photos,
        assignments,
    })
}

pub async fn list_comments(
    issue_id: IssueId,
    include_internal: bool,
    deps: &ServerDeps,
) -> CivicResult<Vec<IssueComment>> {
    Issue::require(issue_id, &deps.db_pool).await?;
    IssueComment::find_for_issue(issue_id, include_internal, &deps.db_pool).await
}
