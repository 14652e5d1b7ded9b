// Mapper to convert domain models to JSON wire types
use crate::domain::chart::{ChartData, ChartKind, ChartSeries};
use crate::domain::dashboard::{DashboardView, FilterPanel};
use crate::domain::kpi::Kpis;
use crate::domain::record::{Dataset, FatalityRecord};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardDto {
    Ready {
        title: String,
        filters: Vec<FilterPanelDto>,
        kpis: KpisDto,
        charts: Vec<ChartDto>,
        table: Vec<RecordDto>,
    },
    Empty {
        title: String,
        filters: Vec<FilterPanelDto>,
        warning: String,
    },
}

#[derive(Debug, Serialize)]
pub struct FilterPanelDto {
    pub dimension: &'static str,
    pub label: String,
    pub options: Vec<String>,
    pub selected: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct KpisDto {
    pub total_fatalities: usize,
    pub mean_age: i64,
    pub mean_age_label: String,
    pub modal_rank: String,
}

#[derive(Debug, Serialize)]
pub struct ChartDto {
    pub id: &'static str,
    pub title: String,
    pub kind: &'static str,
    pub x_title: String,
    pub y_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_legend: Option<Vec<String>>,
    pub data: Vec<Value>,
    /// Ready-to-render Vega-Lite specification.
    pub vega_lite: Value,
}

#[derive(Debug, Serialize)]
pub struct RecordDto {
    pub year: i32,
    pub cause: String,
    pub classification: String,
    pub age: f64,
    pub rank: String,
    pub service: String,
    pub location_type: String,
    pub nature: String,
}

#[derive(Debug, Serialize)]
pub struct DatasetSummaryDto {
    pub source: String,
    pub table: String,
    pub records: usize,
    pub generation: u64,
    pub loaded_at: String,
    pub available: AvailableDto,
}

#[derive(Debug, Serialize)]
pub struct AvailableDto {
    pub years: Vec<i32>,
    pub classifications: Vec<String>,
    pub causes: Vec<String>,
    pub services: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionDto {
    pub session_id: String,
    pub dashboard: DashboardDto,
}

pub fn dashboard_to_json(view: &DashboardView) -> DashboardDto {
    let filters = view.filters().iter().map(panel_to_json).collect();
    match view {
        DashboardView::Ready(dashboard) => DashboardDto::Ready {
            title: dashboard.title.clone(),
            filters,
            kpis: kpis_to_json(&dashboard.kpis),
            charts: dashboard.charts.iter().map(chart_to_json).collect(),
            table: dashboard.table.iter().map(record_to_json).collect(),
        },
        DashboardView::Empty { title, warning, .. } => DashboardDto::Empty {
            title: title.clone(),
            filters,
            warning: warning.clone(),
        },
    }
}

pub fn dataset_to_json(dataset: &Dataset, source: String, table: String) -> DatasetSummaryDto {
    let available = dataset.available();
    DatasetSummaryDto {
        source,
        table,
        records: dataset.len(),
        generation: dataset.generation(),
        loaded_at: dataset.loaded_at().to_rfc3339(),
        available: AvailableDto {
            years: available.years.clone(),
            classifications: available.classifications.clone(),
            causes: available.causes.clone(),
            services: available.services.clone(),
        },
    }
}

fn panel_to_json(panel: &FilterPanel) -> FilterPanelDto {
    FilterPanelDto {
        dimension: panel.dimension.as_str(),
        label: panel.label.clone(),
        options: panel.options.clone(),
        selected: panel.selected.clone(),
    }
}

fn kpis_to_json(kpis: &Kpis) -> KpisDto {
    KpisDto {
        total_fatalities: kpis.total_fatalities,
        mean_age: kpis.mean_age,
        mean_age_label: format!("{} years", kpis.mean_age),
        modal_rank: kpis.modal_rank.clone(),
    }
}

fn record_to_json(record: &FatalityRecord) -> RecordDto {
    RecordDto {
        year: record.year,
        cause: record.cause.clone(),
        classification: record.classification.clone(),
        age: record.age,
        rank: record.rank.clone(),
        service: record.service.clone(),
        location_type: record.location_type.clone(),
        nature: record.nature.clone(),
    }
}

fn chart_to_json(chart: &ChartData) -> ChartDto {
    let data = series_rows(&chart.series);
    ChartDto {
        id: chart.id,
        title: chart.title.clone(),
        kind: kind_name(chart.kind),
        x_title: chart.x_title.clone(),
        y_title: chart.y_title.clone(),
        color_legend: chart.color_legend.clone(),
        vega_lite: vega_lite_spec(chart, &data),
        data,
    }
}

fn kind_name(kind: ChartKind) -> &'static str {
    match kind {
        ChartKind::Histogram => "histogram",
        ChartKind::Bar => "bar",
        ChartKind::Arc => "arc",
        ChartKind::Line => "line",
    }
}

fn series_rows(series: &ChartSeries) -> Vec<Value> {
    match series {
        ChartSeries::Bins(bins) => bins
            .iter()
            .map(|b| json!({ "bin_start": b.start, "bin_end": b.end, "count": b.count }))
            .collect(),
        ChartSeries::Categories(categories) => categories
            .iter()
            .map(|c| json!({ "label": c.label, "count": c.count, "share": c.share }))
            .collect(),
        ChartSeries::Years(years) => years
            .iter()
            .map(|y| json!({ "year": y.year, "count": y.count }))
            .collect(),
    }
}

fn vega_lite_spec(chart: &ChartData, data: &[Value]) -> Value {
    let count = json!({ "field": "count", "type": "quantitative", "title": chart.y_title });
    let (mark, encoding) = match chart.kind {
        ChartKind::Histogram => (
            json!("bar"),
            json!({
                "x": { "field": "bin_start", "bin": { "binned": true }, "type": "quantitative", "title": chart.x_title },
                "x2": { "field": "bin_end" },
                "y": count,
                "tooltip": [
                    { "field": "bin_start", "title": "from" },
                    { "field": "bin_end", "title": "to" },
                    { "field": "count" }
                ]
            }),
        ),
        ChartKind::Bar => {
            let mut encoding = json!({
                "x": { "field": "count", "type": "quantitative", "title": chart.x_title },
                "y": { "field": "label", "type": "nominal", "sort": "-x", "title": chart.y_title },
                "tooltip": [{ "field": "label" }, { "field": "count" }]
            });
            if chart.color_legend.is_some() {
                encoding["color"] = json!({ "field": "label", "type": "nominal", "title": chart.y_title });
            }
            (json!("bar"), encoding)
        }
        ChartKind::Arc => (
            json!({ "type": "arc", "outerRadius": 120 }),
            json!({
                "theta": { "field": "count", "type": "quantitative", "stack": true },
                "color": { "field": "label", "type": "nominal", "title": "Location type" },
                "tooltip": [{ "field": "label" }, { "field": "count" }, { "field": "share", "format": ".1%" }]
            }),
        ),
        ChartKind::Line => (
            json!({ "type": "line", "point": true }),
            json!({
                "x": { "field": "year", "type": "quantitative", "title": chart.x_title, "axis": { "format": "d" } },
                "y": count,
                "tooltip": [{ "field": "year" }, { "field": "count" }]
            }),
        ),
    };

    json!({
        "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
        "title": chart.title,
        "data": { "values": data },
        "mark": mark,
        "encoding": encoding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::{CategoryCount, HistogramBin, TOP_CAUSES, YEARLY_TREND, YearCount};
    use crate::domain::dashboard::Dashboard;
    use crate::domain::filter::Dimension;
    use crate::domain::record::fixtures::record;

    fn panel() -> FilterPanel {
        FilterPanel {
            dimension: Dimension::Year,
            label: "Year(s)".to_string(),
            options: vec!["2019".to_string(), "2020".to_string()],
            selected: vec!["2019".to_string()],
        }
    }

    #[test]
    fn test_empty_view_serializes_with_warning() {
        let view = DashboardView::empty("Title".to_string(), vec![panel()]);
        let value = serde_json::to_value(dashboard_to_json(&view)).unwrap();

        assert_eq!(value["status"], "empty");
        assert_eq!(value["warning"], "No data found for the selected filters.");
        assert_eq!(value["filters"][0]["dimension"], "year");
        assert!(value.get("charts").is_none());
    }

    #[test]
    fn test_ready_view_serializes_kpis_and_table() {
        let view = DashboardView::Ready(Dashboard {
            title: "Title".to_string(),
            filters: vec![panel()],
            kpis: Kpis {
                total_fatalities: 1,
                mean_age: 40,
                modal_rank: "Firefighter".to_string(),
            },
            charts: vec![],
            table: vec![record(2019, "Fall", "Career", "Municipal")],
        });
        let value = serde_json::to_value(dashboard_to_json(&view)).unwrap();

        assert_eq!(value["status"], "ready");
        assert_eq!(value["kpis"]["mean_age_label"], "40 years");
        assert_eq!(value["table"][0]["cause"], "Fall");
        assert_eq!(value["table"][0]["year"], 2019);
    }

    #[test]
    fn test_line_chart_uses_integer_axis() {
        let chart = ChartData {
            id: YEARLY_TREND,
            title: "Fatalities per Year".to_string(),
            x_title: "Year".to_string(),
            y_title: "Number of fatalities".to_string(),
            kind: ChartKind::Line,
            color_legend: None,
            series: ChartSeries::Years(vec![YearCount { year: 2019, count: 7 }]),
        };
        let dto = chart_to_json(&chart);

        assert_eq!(dto.data, vec![json!({ "year": 2019, "count": 7 })]);
        assert_eq!(dto.vega_lite["encoding"]["x"]["axis"]["format"], "d");
        assert_eq!(dto.vega_lite["mark"]["point"], true);
    }

    #[test]
    fn test_cause_chart_is_coloured() {
        let chart = ChartData {
            id: TOP_CAUSES,
            title: "Leading Causes of Fatality".to_string(),
            x_title: "Number of fatalities".to_string(),
            y_title: "Cause".to_string(),
            kind: ChartKind::Bar,
            color_legend: Some(vec!["Fall".to_string()]),
            series: ChartSeries::Categories(vec![CategoryCount {
                label: "Fall".to_string(),
                count: 3,
                share: 1.0,
            }]),
        };
        let dto = chart_to_json(&chart);

        assert_eq!(dto.vega_lite["encoding"]["color"]["field"], "label");
        assert_eq!(dto.vega_lite["encoding"]["y"]["sort"], "-x");
    }

    #[test]
    fn test_histogram_rows() {
        let rows = series_rows(&ChartSeries::Bins(vec![HistogramBin {
            start: 20.0,
            end: 25.0,
            count: 4,
        }]));
        assert_eq!(rows[0]["bin_start"], 20.0);
        assert_eq!(rows[0]["count"], 4);
    }
}
