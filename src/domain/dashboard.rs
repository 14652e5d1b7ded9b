// Dashboard domain model
use super::chart::ChartData;
use super::filter::Dimension;
use super::kpi::Kpis;
use super::record::FatalityRecord;

pub const NO_DATA_WARNING: &str = "No data found for the selected filters.";

/// Sidebar state for one dimension: what can be picked and what is picked.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPanel {
    pub dimension: Dimension,
    pub label: String,
    pub options: Vec<String>,
    pub selected: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub title: String,
    pub filters: Vec<FilterPanel>,
    pub kpis: Kpis,
    pub charts: Vec<ChartData>,
    /// Raw rows of the filtered view.
    pub table: Vec<FatalityRecord>,
}

/// Result of one render pass.
#[derive(Debug, Clone)]
pub enum DashboardView {
    Ready(Dashboard),
    Empty {
        title: String,
        filters: Vec<FilterPanel>,
        warning: String,
    },
}

impl DashboardView {
    pub fn empty(title: String, filters: Vec<FilterPanel>) -> Self {
        DashboardView::Empty {
            title,
            filters,
            warning: NO_DATA_WARNING.to_string(),
        }
    }

    pub fn filters(&self) -> &[FilterPanel] {
        match self {
            DashboardView::Ready(d) => &d.filters,
            DashboardView::Empty { filters, .. } => filters,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DashboardView::Empty { .. })
    }
}
