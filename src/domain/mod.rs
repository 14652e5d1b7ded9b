// Domain layer - Fatality records, filters and derived dashboard views
pub mod chart;
pub mod dashboard;
pub mod filter;
pub mod kpi;
pub mod record;
