//! Integration tests for the issue lifecycle: submission, routing, status
//! transitions and their audit trail.

mod common;

use chrono::Duration;
use civic_core::common::{CivicError, IssueCategory, Location, UserId};
use civic_core::domains::issues::activities::{
    add_comment, attach_photo, create_issue, get_issue, get_issue_detail, list_comments,
    list_issues, update_issue,
};
use civic_core::domains::issues::{
    CommentInput, IssueComment, IssueDraft, IssueFilter, IssuePatch, IssuePriority, IssueStatus,
};
use common::*;
use test_context::test_context;
use tokio_test::{assert_err, assert_ok};
use IssueStatus::*;

#[test_context(TestHarness)]
#[tokio::test]
async fn new_issue_starts_submitted_and_routed(ctx: &TestHarness) {
    let (issue, reporter) = report_pothole(&ctx.deps).await.unwrap();

    assert_eq!(issue.status, Submitted);
    assert_eq!(issue.assigned_department, "road-maintenance");
    assert_eq!(issue.reported_by, Some(reporter));
    assert_eq!(issue.upvote_count, 0);
    assert_eq!(issue.comment_count, 0);
    assert!(issue.resolved_at.is_none());
    assert_eq!(issue.created_at, issue.updated_at);

    let detail = get_issue_detail(issue.id, true, &ctx.deps).await.unwrap();
    assert_eq!(detail.assignments.len(), 1);
    assert_eq!(detail.assignments[0].department_id, "road-maintenance");
    assert!(detail.comments.is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn blank_title_is_rejected_and_nothing_is_stored(ctx: &TestHarness) {
    let reporter = UserId::new();
    let mut bad = draft(IssueCategory::Garbage, reporter);
    bad.title = "   ".to_string();

    let err = create_issue(bad, &ctx.deps).await.unwrap_err();
    assert!(matches!(err, CivicError::Validation(_)));

    let filter = IssueFilter {
        reported_by: Some(reporter),
        ..Default::default()
    };
    assert!(list_issues(&filter, None, &ctx.deps).await.unwrap().is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn anonymous_report_without_account(ctx: &TestHarness) {
    let anonymous = IssueDraft::builder()
        .title("Broken streetlight")
        .description("Dark corner at night")
        .category(IssueCategory::Streetlights)
        .location(Location::address("5th and Pine"))
        .is_anonymous(true)
        .build();

    let issue = assert_ok!(create_issue(anonymous, &ctx.deps).await);
    assert_eq!(issue.reported_by, None);
    assert!(issue.is_anonymous);
    assert_eq!(issue.assigned_department, "electrical");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn full_happy_path_writes_one_audit_entry_per_step(ctx: &TestHarness) {
    let (issue, _) = report_pothole(&ctx.deps).await.unwrap();
    let staff = UserId::new();

    let path = [Acknowledged, Assigned, InProgress, Resolved, Closed];
    for status in path {
        ctx.clock.advance(Duration::minutes(5));
        let updated = update_issue(issue.id, IssuePatch::status(status), Some(staff), &ctx.deps)
            .await
            .unwrap();
        assert_eq!(updated.status, status);
    }

    let transitions: Vec<_> = IssueComment::find_transitions(issue.id, &ctx.deps.db_pool)
        .await
        .unwrap()
        .into_iter()
        .map(|c| (c.old_status.unwrap(), c.new_status.unwrap()))
        .collect();

    assert_eq!(
        transitions,
        vec![
            (Submitted, Acknowledged),
            (Acknowledged, Assigned),
            (Assigned, InProgress),
            (InProgress, Resolved),
            (Resolved, Closed),
        ]
    );

    // Status entries do not count as discussion
    let closed = get_issue(issue.id, &ctx.deps).await.unwrap();
    assert_eq!(closed.comment_count, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn submitted_cannot_jump_to_resolved(ctx: &TestHarness) {
    let (issue, _) = report_pothole(&ctx.deps).await.unwrap();

    let err = update_issue(issue.id, IssuePatch::status(Resolved), None, &ctx.deps)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CivicError::InvalidTransition {
            from: Submitted,
            to: Resolved
        }
    ));

    let unchanged = get_issue(issue.id, &ctx.deps).await.unwrap();
    assert_eq!(unchanged, issue);
    assert!(list_comments(issue.id, true, &ctx.deps).await.unwrap().is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn resolved_at_is_stamped_on_resolve_and_kept_on_close(ctx: &TestHarness) {
    let (issue, _) = report_pothole(&ctx.deps).await.unwrap();
    let staff = UserId::new();

    let in_progress = advance_through(&issue, &[Acknowledged, InProgress], staff, &ctx.deps)
        .await
        .unwrap();
    assert!(in_progress.resolved_at.is_none());

    ctx.clock.advance(Duration::hours(3));
    let resolved = advance_through(&in_progress, &[Resolved], staff, &ctx.deps)
        .await
        .unwrap();
    let stamped = resolved.resolved_at.expect("resolved_at set on resolve");
    assert_eq!(stamped, resolved.updated_at);

    ctx.clock.advance(Duration::days(1));
    let closed = advance_through(&resolved, &[Closed], staff, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(closed.resolved_at, Some(stamped));
    assert!(closed.updated_at > stamped);

    // No reopen path
    assert_err!(
        update_issue(issue.id, IssuePatch::status(Submitted), Some(staff), &ctx.deps).await
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn stale_expected_status_is_rejected(ctx: &TestHarness) {
    let (issue, _) = report_pothole(&ctx.deps).await.unwrap();
    let staff = UserId::new();

    advance_through(&issue, &[Acknowledged], staff, &ctx.deps)
        .await
        .unwrap();

    // A second client still thinks the issue is submitted
    let stale = IssuePatch {
        status: Some(Assigned),
        expected_status: Some(Submitted),
        ..Default::default()
    };
    let err = update_issue(issue.id, stale, Some(staff), &ctx.deps)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CivicError::InvalidTransition {
            from: Acknowledged,
            to: Assigned
        }
    ));

    let fresh = IssuePatch {
        status: Some(Assigned),
        expected_status: Some(Acknowledged),
        ..Default::default()
    };
    let updated = update_issue(issue.id, fresh, Some(staff), &ctx.deps)
        .await
        .unwrap();
    assert_eq!(updated.status, Assigned);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn concurrent_updates_apply_one_transition(ctx: &TestHarness) {
    let (issue, _) = report_pothole(&ctx.deps).await.unwrap();

    let first = update_issue(issue.id, IssuePatch::status(Acknowledged), None, &ctx.deps);
    let second = update_issue(issue.id, IssuePatch::status(Acknowledged), None, &ctx.deps);
    let (first, second) = tokio::join!(first, second);

    // The loser sees the committed status and acknowledged -> acknowledged is not an edge
    assert_eq!(
        [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
        1
    );
    let transitions = IssueComment::find_transitions(issue.id, &ctx.deps.db_pool)
        .await
        .unwrap();
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].new_status, Some(Acknowledged));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn reassignment_records_history(ctx: &TestHarness) {
    let (issue, _) = report_pothole(&ctx.deps).await.unwrap();
    let supervisor = UserId::new();
    let crew = UserId::new();

    let patch = IssuePatch {
        department_id: Some("public-safety".to_string()),
        assigned_staff: Some(crew),
        priority: Some(IssuePriority::Urgent),
        ..Default::default()
    };
    let updated = update_issue(issue.id, patch, Some(supervisor), &ctx.deps)
        .await
        .unwrap();
    assert_eq!(updated.assigned_department, "public-safety");
    assert_eq!(updated.assigned_staff, Some(crew));
    assert_eq!(updated.priority, IssuePriority::Urgent);

    let detail = get_issue_detail(issue.id, true, &ctx.deps).await.unwrap();
    assert!(detail
        .assignments
        .iter()
        .any(|a| a.assigned_to == Some(crew) && a.assigned_by == Some(supervisor)));

    let unknown = IssuePatch {
        department_id: Some("department-of-redundancy".to_string()),
        ..Default::default()
    };
    let err = update_issue(issue.id, unknown, Some(supervisor), &ctx.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, CivicError::NotFound { .. }));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn internal_comments_are_hidden_and_not_counted(ctx: &TestHarness) {
    let (issue, reporter) = report_pothole(&ctx.deps).await.unwrap();
    let staff = UserId::new();

    add_comment(issue.id, Some(reporter), "It is getting bigger".into(), false, &ctx.deps)
        .await
        .unwrap();
    add_comment(issue.id, Some(staff), "Crew scheduled Tuesday".into(), true, &ctx.deps)
        .await
        .unwrap();

    let patch = IssuePatch {
        comment: Some(CommentInput {
            content: "Asphalt on order".to_string(),
            is_internal: true,
        }),
        ..Default::default()
    };
    update_issue(issue.id, patch, Some(staff), &ctx.deps)
        .await
        .unwrap();

    let public = list_comments(issue.id, false, &ctx.deps).await.unwrap();
    assert_eq!(public.len(), 1);
    assert!(!public[0].is_internal);

    let all = list_comments(issue.id, true, &ctx.deps).await.unwrap();
    assert_eq!(all.len(), 3);

    let issue = get_issue(issue.id, &ctx.deps).await.unwrap();
    assert_eq!(issue.comment_count, 1);

    let err = add_comment(issue.id, Some(reporter), "".into(), false, &ctx.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, CivicError::Validation(_)));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn photos_are_attached_verbatim(ctx: &TestHarness) {
    let (issue, reporter) = report_pothole(&ctx.deps).await.unwrap();
    let url = "https://blobs.example/issues/abc123.jpg?sig=xyz";

    let photo = attach_photo(
        issue.id,
        url.to_string(),
        Some("Front wheel for scale".to_string()),
        Some(reporter),
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(photo.photo_url, url);

    let detail = get_issue_detail(issue.id, false, &ctx.deps).await.unwrap();
    assert_eq!(detail.photos.len(), 1);
    assert_eq!(detail.photos[0].id, photo.id);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn unknown_issue_is_not_found(ctx: &TestHarness) {
    let missing = civic_core::common::IssueId::new();

    assert!(matches!(
        get_issue(missing, &ctx.deps).await,
        Err(CivicError::NotFound { .. })
    ));
    assert!(matches!(
        update_issue(missing, IssuePatch::status(Acknowledged), None, &ctx.deps).await,
        Err(CivicError::NotFound { .. })
    ));
    assert!(matches!(
        add_comment(missing, None, "hello".into(), false, &ctx.deps).await,
        Err(CivicError::NotFound { .. })
    ));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn list_filters_by_status_and_reporter(ctx: &TestHarness) {
    let reporter = UserId::new();
    let first = create_issue(draft(IssueCategory::Noise, reporter), &ctx.deps)
        .await
        .unwrap();
    ctx.clock.advance(Duration::minutes(1));
    let second = create_issue(draft(IssueCategory::Traffic, reporter), &ctx.deps)
        .await
        .unwrap();
    advance_through(&second, &[Acknowledged], UserId::new(), &ctx.deps)
        .await
        .unwrap();

    let mine = IssueFilter {
        reported_by: Some(reporter),
        ..Default::default()
    };
    let listed = list_issues(&mine, None, &ctx.deps).await.unwrap();
    assert_eq!(
        listed.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![second.id, first.id]
    );

    let submitted = IssueFilter {
        status: Some(Submitted),
        ..mine.clone()
    };
    let listed = list_issues(&submitted, None, &ctx.deps).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, first.id);

    let limited = list_issues(&mine, Some(1), &ctx.deps).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn negative_list_limit_is_a_validation_error(ctx: &TestHarness) {
    let (_, reporter) = report_pothole(&ctx.deps).await.unwrap();
    let mine = IssueFilter {
        reported_by: Some(reporter),
        ..Default::default()
    };

    let err = list_issues(&mine, Some(-1), &ctx.deps).await.unwrap_err();
    assert!(matches!(err, CivicError::Validation(_)));
    assert!(!err.is_fatal());

    let none = list_issues(&mine, Some(0), &ctx.deps).await.unwrap();
    assert!(none.is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn issue_topic_carries_public_changes_only(ctx: &TestHarness) {
    use civic_core::kernel::{HubMessage, Topic};

    let (issue, reporter) = report_pothole(&ctx.deps).await.unwrap();
    let mut subscription = ctx.deps.stream_hub.subscribe(&Topic::Issue(issue.id)).await;

    add_comment(issue.id, Some(UserId::new()), "internal".into(), true, &ctx.deps)
        .await
        .unwrap();
    add_comment(issue.id, Some(reporter), "public".into(), false, &ctx.deps)
        .await
        .unwrap();
    update_issue(issue.id, IssuePatch::status(Acknowledged), None, &ctx.deps)
        .await
        .unwrap();

    let mut kinds = Vec::new();
    while let Some(HubMessage::Event(event)) = subscription.try_recv() {
        kinds.push(event["type"].as_str().unwrap().to_string());
        if event["type"] == "comment_added" {
            assert_eq!(event["comment"]["content"], "public");
        }
    }
    assert_eq!(kinds, vec!["comment_added", "issue_updated"]);

    subscription.unsubscribe().await;
}
