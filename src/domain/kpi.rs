// Headline statistics over the filtered view
use crate::domain::chart::count_by;
use crate::domain::filter::FilteredView;

#[derive(Debug, Clone, PartialEq)]
pub struct Kpis {
    pub total_fatalities: usize,
    /// Mean age truncated toward zero.
    pub mean_age: i64,
    pub modal_rank: String,
}

impl Kpis {
    /// `None` for an empty view; there is nothing to summarise.
    pub fn compute(view: &FilteredView<'_>) -> Option<Self> {
        if view.is_empty() {
            return None;
        }
        let total = view.len();
        let age_sum: f64 = view.iter().map(|r| r.age).sum();
        let mean_age = (age_sum / total as f64).trunc() as i64;
        let modal_rank = mode(view.iter().map(|r| r.rank.as_str()))?;

        Some(Self {
            total_fatalities: total,
            mean_age,
            modal_rank,
        })
    }
}

/// Most frequent value; ties go to the value seen first.
pub fn mode<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    count_by(values).into_iter().next().map(|(value, _)| value)
}
