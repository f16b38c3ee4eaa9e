//! Issue, comment, photo and upvote endpoints.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::common::{CivicError, IssueCategory, IssueId, Location, UserId};
use crate::domains::issues::activities as issues;
use crate::domains::issues::{
    Issue, IssueComment, IssueDetail, IssueDraft, IssueFilter, IssuePatch, IssuePriority,
    IssueStatus,
};
use crate::domains::issues::models::IssuePhoto;
use crate::domains::upvotes::activities::toggle_upvote;
use crate::domains::upvotes::UpvoteToggle;
use crate::server::app::AppState;
use crate::server::auth::AccessPolicy;
use crate::server::error::ApiResult;
use crate::server::middleware::AuthUser;

/// Submission body. Fields are optional here so a missing one is reported as
/// a validation error rather than a body rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateIssueRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    pub priority: Option<IssuePriority>,
    pub location: Option<Location>,
    #[serde(default)]
    pub is_anonymous: bool,
}

impl CreateIssueRequest {
    fn into_draft(self, reporter: Option<UserId>) -> Result<IssueDraft, CivicError> {
        let category: IssueCategory = self
            .category
            .ok_or_else(|| CivicError::Validation("category is required".into()))?
            .parse()?;
        let location = self
            .location
            .ok_or_else(|| CivicError::Validation("location address is required".into()))?;

        Ok(IssueDraft {
            title: self.title,
            description: self.description,
            category,
            priority: self.priority.unwrap_or_default(),
            location,
            reported_by: reporter,
            is_anonymous: self.is_anonymous,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IssueListQuery {
    pub status: Option<IssueStatus>,
    /// Parsed in the handler so an unknown value gets a JSON validation error.
    pub category: Option<String>,
    pub reported_by: Option<UserId>,
    pub assigned_to: Option<UserId>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddCommentRequest {
    pub content: String,
    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttachPhotoRequest {
    pub photo_url: String,
    pub caption: Option<String>,
}

pub async fn create_issue_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(body): Json<CreateIssueRequest>,
) -> ApiResult<(StatusCode, Json<Issue>)> {
    let user = user.map(|Extension(u)| u);
    let draft = body.into_draft(user.as_ref().map(|u| u.user_id))?;
    let issue = issues::create_issue(draft, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(AccessPolicy::redact(user.as_ref(), issue))))
}

pub async fn list_issues_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Query(query): Query<IssueListQuery>,
) -> ApiResult<Json<Vec<Issue>>> {
    let user = user.map(|Extension(u)| u);
    let category = query
        .category
        .as_deref()
        .map(str::parse::<IssueCategory>)
        .transpose()?;
    let filter = IssueFilter {
        status: query.status,
        category,
        reported_by: query.reported_by,
        assigned_to: query.assigned_to,
    };
    let found = issues::list_issues(&filter, query.limit, &state.deps).await?;
    Ok(Json(
        found
            .into_iter()
            .map(|issue| AccessPolicy::redact(user.as_ref(), issue))
            .collect(),
    ))
}

pub async fn get_issue_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(issue_id): Path<IssueId>,
) -> ApiResult<Json<IssueDetail>> {
    let user = user.map(|Extension(u)| u);
    let mut detail = issues::get_issue_detail(
        issue_id,
        AccessPolicy::can_view_internal(user.as_ref()),
        &state.deps,
    )
    .await?;
    detail.issue = AccessPolicy::redact(user.as_ref(), detail.issue);
    Ok(Json(detail))
}

pub async fn update_issue_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(issue_id): Path<IssueId>,
    Json(patch): Json<IssuePatch>,
) -> ApiResult<Json<Issue>> {
    let user = user.map(|Extension(u)| u);
    AccessPolicy::check_patch(user.as_ref(), &patch)?;
    let issue =
        issues::update_issue(issue_id, patch, user.as_ref().map(|u| u.user_id), &state.deps)
            .await?;
    Ok(Json(AccessPolicy::redact(user.as_ref(), issue)))
}

pub async fn list_comments_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(issue_id): Path<IssueId>,
) -> ApiResult<Json<Vec<IssueComment>>> {
    let user = user.map(|Extension(u)| u);
    let comments = issues::list_comments(
        issue_id,
        AccessPolicy::can_view_internal(user.as_ref()),
        &state.deps,
    )
    .await?;
    Ok(Json(comments))
}

pub async fn add_comment_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(issue_id): Path<IssueId>,
    Json(body): Json<AddCommentRequest>,
) -> ApiResult<(StatusCode, Json<IssueComment>)> {
    let user = user.map(|Extension(u)| u);
    AccessPolicy::check_internal_comment(user.as_ref(), body.is_internal)?;
    let comment = issues::add_comment(
        issue_id,
        user.as_ref().map(|u| u.user_id),
        body.content,
        body.is_internal,
        &state.deps,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn attach_photo_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(issue_id): Path<IssueId>,
    Json(body): Json<AttachPhotoRequest>,
) -> ApiResult<(StatusCode, Json<IssuePhoto>)> {
    let uploaded_by = user.map(|Extension(u)| u.user_id);
    let photo =
        issues::attach_photo(issue_id, body.photo_url, body.caption, uploaded_by, &state.deps)
            .await?;
    Ok((StatusCode::CREATED, Json(photo)))
}

pub async fn toggle_upvote_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(issue_id): Path<IssueId>,
) -> ApiResult<Json<UpvoteToggle>> {
    let user = user.map(|Extension(u)| u);
    let user = AccessPolicy::require_user(user.as_ref())?;
    let result = toggle_upvote(issue_id, user.user_id, &state.deps).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_category_is_a_validation_error() {
        let body: CreateIssueRequest = serde_json::from_str(
            r#"{"title":"t","description":"d","category":"volcano","location":{"address":"x"}}"#,
        )
        .unwrap();
        assert!(matches!(
            body.into_draft(None),
            Err(CivicError::Validation(_))
        ));
    }

    #[test]
    fn missing_location_is_a_validation_error() {
        let body: CreateIssueRequest =
            serde_json::from_str(r#"{"title":"t","description":"d","category":"potholes"}"#)
                .unwrap();
        assert!(matches!(
            body.into_draft(None),
            Err(CivicError::Validation(_))
        ));
    }

    #[test]
    fn draft_carries_reporter_and_default_priority() {
        let reporter = UserId::new();
        let body: CreateIssueRequest = serde_json::from_value(serde_json::json!({
            "title": "t",
            "description": "d",
            "category": "water-leaks",
            "location": {"address": "x"},
        }))
        .unwrap();
        let draft = body.into_draft(Some(reporter)).unwrap();
        assert_eq!(draft.category, IssueCategory::WaterLeaks);
        assert_eq!(draft.priority, IssuePriority::Medium);
        assert_eq!(draft.reported_by, Some(reporter));
    }

    #[test]
    fn create_and_list_accept_the_same_category_spellings() {
        let query: IssueListQuery = serde_json::from_str(r#"{"category":"water-leaks"}"#).unwrap();
        let listed: IssueCategory = query.category.unwrap().parse().unwrap();

        let draft: IssueDraft = serde_json::from_value(serde_json::json!({
            "title": "t",
            "description": "d",
            "category": "water-leaks",
            "location": {"address": "x"},
        }))
        .unwrap();
        assert_eq!(listed, draft.category);
    }

    #[test]
    fn list_query_rejects_unknown_fields() {
        let parsed: Result<IssueListQuery, _> =
            serde_json::from_str(r#"{"status":"submitted","ward":"3"}"#);
        assert!(parsed.is_err());
    }
}
