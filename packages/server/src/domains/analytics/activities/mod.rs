mod dashboard;

pub use dashboard::get_dashboard_snapshot;
