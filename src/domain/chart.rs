// Chart domain models and the five chart builders
use crate::domain::filter::FilteredView;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Histogram,
    /// Horizontal bars, categories on the y axis.
    Bar,
    Arc,
    /// Line with point markers.
    Line,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
    /// Fraction of the chart's total.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearCount {
    pub year: i32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartSeries {
    Bins(Vec<HistogramBin>),
    Categories(Vec<CategoryCount>),
    Years(Vec<YearCount>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub id: &'static str,
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub kind: ChartKind,
    /// Category labels that get a distinct colour, in legend order.
    pub color_legend: Option<Vec<String>>,
    pub series: ChartSeries,
}

#[derive(Debug, Clone, Copy)]
pub struct ChartOptions {
    pub histogram_max_bins: usize,
    pub top_n: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            histogram_max_bins: 20,
            top_n: 10,
        }
    }
}

pub const AGE_HISTOGRAM: &str = "age_histogram";
pub const TOP_RANKS: &str = "top_ranks";
pub const TOP_CAUSES: &str = "top_causes";
pub const LOCATION_TYPES: &str = "location_types";
pub const YEARLY_TREND: &str = "yearly_trend";

/// Build all five charts for a non-empty view.
pub fn build_charts(
    view: &FilteredView<'_>,
    selected_years: &BTreeSet<i32>,
    options: ChartOptions,
) -> Vec<ChartData> {
    vec![
        age_histogram(view, options.histogram_max_bins),
        top_ranks(view, options.top_n),
        top_causes(view, options.top_n),
        location_composition(view),
        yearly_trend(view, selected_years),
    ]
}

pub fn age_histogram(view: &FilteredView<'_>, max_bins: usize) -> ChartData {
    let ages: Vec<f64> = view.iter().map(|r| r.age).collect();
    ChartData {
        id: AGE_HISTOGRAM,
        title: "Age Distribution of Fatalities".to_string(),
        x_title: "Age range".to_string(),
        y_title: "Number of fatalities".to_string(),
        kind: ChartKind::Histogram,
        color_legend: None,
        series: ChartSeries::Bins(bin_values(&ages, max_bins)),
    }
}

pub fn top_ranks(view: &FilteredView<'_>, n: usize) -> ChartData {
    let mut counts = count_by(view.iter().map(|r| r.rank.as_str()));
    counts.truncate(n);
    ChartData {
        id: TOP_RANKS,
        title: format!("Top {n} Ranks by Fatalities"),
        x_title: "Number of fatalities".to_string(),
        y_title: "Rank".to_string(),
        kind: ChartKind::Bar,
        color_legend: None,
        series: ChartSeries::Categories(with_shares(counts)),
    }
}

pub fn top_causes(view: &FilteredView<'_>, n: usize) -> ChartData {
    let top: HashSet<String> = count_by(view.iter().map(|r| r.cause.as_str()))
        .into_iter()
        .take(n)
        .map(|(label, _)| label)
        .collect();
    let restricted = view.retain_where(|r| top.contains(&r.cause));

    let counts = count_by(restricted.iter().map(|r| r.cause.as_str()));
    let legend = counts.iter().map(|(label, _)| label.clone()).collect();
    ChartData {
        id: TOP_CAUSES,
        title: "Leading Causes of Fatality".to_string(),
        x_title: "Number of fatalities".to_string(),
        y_title: "Cause".to_string(),
        kind: ChartKind::Bar,
        color_legend: Some(legend),
        series: ChartSeries::Categories(with_shares(counts)),
    }
}

pub fn location_composition(view: &FilteredView<'_>) -> ChartData {
    let counts = count_by(view.iter().map(|r| r.location_type.as_str()));
    let legend = counts.iter().map(|(label, _)| label.clone()).collect();
    ChartData {
        id: LOCATION_TYPES,
        title: "Fatalities by Location Type".to_string(),
        x_title: String::new(),
        y_title: "Number of fatalities".to_string(),
        kind: ChartKind::Arc,
        color_legend: Some(legend),
        series: ChartSeries::Categories(with_shares(counts)),
    }
}

pub fn yearly_trend(view: &FilteredView<'_>, selected_years: &BTreeSet<i32>) -> ChartData {
    let mut per_year: BTreeMap<i32, usize> = BTreeMap::new();
    for record in view.iter().filter(|r| selected_years.contains(&r.year)) {
        *per_year.entry(record.year).or_default() += 1;
    }
    ChartData {
        id: YEARLY_TREND,
        title: "Fatalities per Year".to_string(),
        x_title: "Year".to_string(),
        y_title: "Number of fatalities".to_string(),
        kind: ChartKind::Line,
        color_legend: None,
        series: ChartSeries::Years(
            per_year
                .into_iter()
                .map(|(year, count)| YearCount { year, count })
                .collect(),
        ),
    }
}

/// Frequencies sorted by descending count; equal counts keep first-seen order.
pub fn count_by<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for value in values {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value.to_string(), 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn with_shares(counts: Vec<(String, usize)>) -> Vec<CategoryCount> {
    let total: usize = counts.iter().map(|(_, c)| c).sum();
    counts
        .into_iter()
        .map(|(label, count)| CategoryCount {
            label,
            count,
            share: if total == 0 { 0.0 } else { count as f64 / total as f64 },
        })
        .collect()
}

/// Equal-width bins aligned to a 1/2/5 x 10^k step (k >= 0), at most
/// `max_bins` of them.
pub fn bin_values(values: &[f64], max_bins: usize) -> Vec<HistogramBin> {
    let Some((min, max)) = min_max(values) else {
        return Vec::new();
    };
    let step = nice_step(min, max, max_bins.max(1));
    let first = (min / step).floor();
    let bin_count = ((max / step).floor() - first) as usize + 1;

    let mut counts = vec![0usize; bin_count];
    for &v in values {
        let idx = ((v / step).floor() - first) as usize;
        counts[idx.min(bin_count - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: (first + i as f64) * step,
            end: (first + i as f64 + 1.0) * step,
            count,
        })
        .collect()
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

fn nice_step(min: f64, max: f64, max_bins: usize) -> f64 {
    let span = max - min;
    if span <= 0.0 {
        return 1.0;
    }
    // ages are whole years, so never go below a step of one
    let mut exponent = ((span / max_bins as f64).log10().floor() as i32).max(0);
    loop {
        for multiplier in [1.0, 2.0, 5.0] {
            let step = multiplier * 10f64.powi(exponent);
            let bins = (max / step).floor() - (min / step).floor() + 1.0;
            if bins <= max_bins as f64 {
                return step;
            }
        }
        exponent += 1;
    }
}
