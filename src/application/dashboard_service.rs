// Dashboard service - One render pass from dataset and filters to a view
use crate::domain::chart::{ChartOptions, build_charts};
use crate::domain::dashboard::{Dashboard, DashboardView, FilterPanel};
use crate::domain::filter::{Dimension, FilterState, apply_filters};
use crate::domain::kpi::Kpis;
use crate::domain::record::Dataset;

#[derive(Debug, Clone)]
pub struct DashboardService {
    title: String,
    chart_options: ChartOptions,
}

impl DashboardService {
    pub fn new(title: String, chart_options: ChartOptions) -> Self {
        Self {
            title,
            chart_options,
        }
    }

    /// Filter, summarise and chart. An empty filtered view yields the
    /// warning view with no KPIs, charts or table.
    pub fn render(&self, dataset: &Dataset, filters: &FilterState) -> DashboardView {
        let panels = self.filter_panels(dataset, filters);
        let view = apply_filters(dataset, filters);

        let Some(kpis) = Kpis::compute(&view) else {
            tracing::debug!("No records match the current filters");
            return DashboardView::empty(self.title.clone(), panels);
        };

        let charts = build_charts(&view, filters.years(), self.chart_options);
        tracing::debug!(
            "Rendered dashboard: {} of {} records, {} charts",
            view.len(),
            dataset.len(),
            charts.len()
        );

        DashboardView::Ready(Dashboard {
            title: self.title.clone(),
            filters: panels,
            kpis,
            charts,
            table: view.iter().cloned().collect(),
        })
    }

    fn filter_panels(&self, dataset: &Dataset, filters: &FilterState) -> Vec<FilterPanel> {
        let available = dataset.available();
        Dimension::ALL
            .into_iter()
            .map(|dimension| {
                let options = match dimension {
                    Dimension::Year => available.years.iter().map(i32::to_string).collect(),
                    Dimension::Classification => available.classifications.clone(),
                    Dimension::Cause => available.causes.clone(),
                    Dimension::Service => available.services.clone(),
                };
                FilterPanel {
                    dimension,
                    label: dimension.label().to_string(),
                    options,
                    selected: filters.selected(dimension, available),
                }
            })
            .collect()
    }
}
