//! Dashboard aggregates and the pure computation behind them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::IssueCategory;
use crate::domains::departments::DepartmentCatalog;
use crate::domains::issues::models::IssueStatus;

/// Highest department score.
pub const MAX_SCORE: f64 = 5.0;

/// How many categories `top_categories` keeps.
pub const TOP_CATEGORY_COUNT: usize = 5;

/// The columns of an issue the aggregates read.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IssueStat {
    pub category: IssueCategory,
    pub status: IssueStatus,
    pub assigned_department: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPayload {
    pub total_issues: i64,
    /// Resolved or closed.
    pub resolved_issues: i64,
    pub average_response_time_hours: f64,
    pub category_histogram: BTreeMap<IssueCategory, i64>,
    pub top_categories: Vec<CategoryCount>,
    pub department_performance: Vec<DepartmentPerformance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: IssueCategory,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPerformance {
    pub department_id: String,
    pub name: String,
    pub total: i64,
    /// Issues with a `resolved_at`.
    pub resolved: i64,
    pub score: f64,
    pub avg_response_time_hours: f64,
}

/// `min(5, resolved / total * 5)`, or 0 for a department with no issues.
pub fn department_score(total: i64, resolved: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (resolved as f64 / total as f64 * MAX_SCORE).min(MAX_SCORE)
}

fn response_hours(stat: &IssueStat) -> Option<f64> {
    stat.resolved_at
        .map(|resolved_at| (resolved_at - stat.created_at).num_milliseconds() as f64 / 3_600_000.0)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[derive(Default)]
struct DepartmentTally {
    total: i64,
    response_hours: Vec<f64>,
}

/// Compute the dashboard from issue rows.
///
/// Every catalog department appears, in catalog order, even with no issues.
/// Departments found on issues but missing from the catalog follow, by id.
pub fn compute_dashboard(stats: &[IssueStat], catalog: &DepartmentCatalog) -> DashboardPayload {
    let mut histogram: BTreeMap<IssueCategory, i64> =
        IssueCategory::ALL.iter().map(|c| (*c, 0)).collect();
    let mut tallies: BTreeMap<&str, DepartmentTally> = BTreeMap::new();
    let mut all_hours = Vec::new();
    let mut resolved_issues = 0;

    for stat in stats {
        *histogram.entry(stat.category).or_insert(0) += 1;
        if stat.status.is_resolved_lineage() {
            resolved_issues += 1;
        }

        let tally = tallies.entry(stat.assigned_department.as_str()).or_default();
        tally.total += 1;
        if let Some(hours) = response_hours(stat) {
            tally.response_hours.push(hours);
            all_hours.push(hours);
        }
    }

    let performance = |id: &str, name: &str, tally: Option<&DepartmentTally>| {
        let (total, hours) = tally
            .map(|t| (t.total, t.response_hours.as_slice()))
            .unwrap_or((0, &[][..]));
        let resolved = hours.len() as i64;
        DepartmentPerformance {
            department_id: id.to_string(),
            name: name.to_string(),
            total,
            resolved,
            score: department_score(total, resolved),
            avg_response_time_hours: mean(hours),
        }
    };

    let mut department_performance: Vec<DepartmentPerformance> = catalog
        .departments()
        .iter()
        .map(|d| performance(&d.id, &d.name, tallies.get(d.id.as_str())))
        .collect();
    department_performance.extend(
        tallies
            .iter()
            .filter(|(id, _)| catalog.get(**id).is_none())
            .map(|(id, tally)| performance(*id, *id, Some(tally))),
    );

    let mut top_categories: Vec<CategoryCount> = histogram
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(category, count)| CategoryCount {
            category: *category,
            count: *count,
        })
        .collect();
    // Stable sort keeps category order among ties.
    top_categories.sort_by(|a, b| b.count.cmp(&a.count));
    top_categories.truncate(TOP_CATEGORY_COUNT);

    DashboardPayload {
        total_issues: stats.len() as i64,
        resolved_issues,
        average_response_time_hours: mean(&all_hours),
        category_histogram: histogram,
        top_categories,
        department_performance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn stat(
        category: IssueCategory,
        department: &str,
        status: IssueStatus,
        resolved_after_hours: Option<i64>,
    ) -> IssueStat {
        IssueStat {
            category,
            status,
            assigned_department: department.to_string(),
            created_at: at(0),
            resolved_at: resolved_after_hours.map(at),
        }
    }

    #[test]
    fn score_for_four_of_ten_is_two() {
        assert_eq!(department_score(10, 4), 2.0);
    }

    #[test]
    fn score_is_zero_without_issues_and_capped_at_five() {
        assert_eq!(department_score(0, 0), 0.0);
        assert_eq!(department_score(3, 3), 5.0);
        assert_eq!(department_score(2, 5), 5.0);
    }

    #[test]
    fn department_with_ten_issues_four_resolved() {
        let catalog = DepartmentCatalog::builtin();
        let mut stats = Vec::new();
        for i in 0..10 {
            let resolved = (i < 4).then_some(10);
            let status = if i < 4 {
                IssueStatus::Resolved
            } else {
                IssueStatus::InProgress
            };
            stats.push(stat(IssueCategory::Potholes, "road-maintenance", status, resolved));
        }

        let payload = compute_dashboard(&stats, &catalog);
        let roads = payload
            .department_performance
            .iter()
            .find(|d| d.department_id == "road-maintenance")
            .unwrap();
        assert_eq!(roads.total, 10);
        assert_eq!(roads.resolved, 4);
        assert_eq!(roads.score, 2.0);
        assert_eq!(roads.avg_response_time_hours, 10.0);
        assert_eq!(payload.total_issues, 10);
        assert_eq!(payload.resolved_issues, 4);
    }

    #[test]
    fn every_catalog_department_is_reported() {
        let catalog = DepartmentCatalog::builtin();
        let payload = compute_dashboard(&[], &catalog);

        assert_eq!(
            payload.department_performance.len(),
            catalog.departments().len()
        );
        assert!(payload
            .department_performance
            .iter()
            .all(|d| d.total == 0 && d.score == 0.0 && d.avg_response_time_hours == 0.0));
        assert_eq!(payload.average_response_time_hours, 0.0);
        assert!(payload.top_categories.is_empty());
        assert_eq!(payload.category_histogram.len(), IssueCategory::ALL.len());
    }

    #[test]
    fn closed_counts_as_resolved_and_keeps_response_time() {
        let catalog = DepartmentCatalog::builtin();
        let stats = vec![
            stat(IssueCategory::WaterLeaks, "water", IssueStatus::Closed, Some(4)),
            stat(IssueCategory::WaterLeaks, "water", IssueStatus::Resolved, Some(2)),
            stat(IssueCategory::WaterLeaks, "water", IssueStatus::Submitted, None),
        ];
        let payload = compute_dashboard(&stats, &catalog);

        assert_eq!(payload.resolved_issues, 2);
        assert_eq!(payload.average_response_time_hours, 3.0);
        let water = payload
            .department_performance
            .iter()
            .find(|d| d.department_id == "water")
            .unwrap();
        assert_eq!(water.resolved, 2);
        assert_eq!(water.avg_response_time_hours, 3.0);
    }

    #[test]
    fn top_categories_orders_by_count_then_category() {
        let catalog = DepartmentCatalog::builtin();
        let mut stats = Vec::new();
        let counts = [
            (IssueCategory::Noise, 3),
            (IssueCategory::Garbage, 3),
            (IssueCategory::Potholes, 5),
            (IssueCategory::Traffic, 1),
            (IssueCategory::Other, 1),
            (IssueCategory::Streetlights, 2),
        ];
        for (category, n) in counts {
            for _ in 0..n {
                stats.push(stat(category, "general", IssueStatus::Submitted, None));
            }
        }

        let payload = compute_dashboard(&stats, &catalog);
        let top: Vec<_> = payload.top_categories.iter().map(|c| c.category).collect();
        assert_eq!(
            top,
            vec![
                IssueCategory::Potholes,
                IssueCategory::Garbage,
                IssueCategory::Noise,
                IssueCategory::Streetlights,
                IssueCategory::Traffic,
            ]
        );
        assert_eq!(payload.category_histogram[&IssueCategory::Potholes], 5);
    }

    #[test]
    fn unknown_department_is_appended() {
        let catalog = DepartmentCatalog::builtin();
        let stats = vec![stat(IssueCategory::Other, "parks", IssueStatus::Submitted, None)];
        let payload = compute_dashboard(&stats, &catalog);
        let last = payload.department_performance.last().unwrap();
        assert_eq!(last.department_id, "parks");
        assert_eq!(last.total, 1);
    }

    #[test]
    fn payload_uses_camel_case_keys() {
        let payload = compute_dashboard(&[], &DepartmentCatalog::builtin());
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("totalIssues").is_some());
        assert!(json.get("categoryHistogram").is_some());
        assert!(json["departmentPerformance"][0].get("avgResponseTimeHours").is_some());
    }
}
