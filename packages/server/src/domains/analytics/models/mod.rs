pub mod payload;
pub mod snapshot;

pub use payload::{
    compute_dashboard, department_score, CategoryCount, DashboardPayload, DepartmentPerformance,
    IssueStat,
};
pub use snapshot::AnalyticsSnapshot;
