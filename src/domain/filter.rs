// Filter dimensions, per-session selection state and filter application
use crate::domain::record::{AvailableValues, Dataset, FatalityRecord};
use crate::error::Error;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A filterable dimension of the fatality table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Year,
    Classification,
    Cause,
    Service,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Year,
        Dimension::Classification,
        Dimension::Cause,
        Dimension::Service,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Year => "year",
            Dimension::Classification => "classification",
            Dimension::Cause => "cause",
            Dimension::Service => "service",
        }
    }

    /// Sidebar label for the dimension's multi-select.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Year => "Year(s)",
            Dimension::Classification => "Classification",
            Dimension::Cause => "Cause",
            Dimension::Service => "Service type",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| Error::UnknownDimension(s.to_string()))
    }
}

/// A user-supplied option value, before it is matched to a dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Number(i64),
    Text(String),
}

impl FilterValue {
    fn as_year(&self) -> Option<i32> {
        match self {
            FilterValue::Number(n) => i32::try_from(*n).ok(),
            FilterValue::Text(s) => s.trim().parse().ok(),
        }
    }

    fn as_text(&self) -> String {
        match self {
            FilterValue::Number(n) => n.to_string(),
            FilterValue::Text(s) => s.clone(),
        }
    }
}

/// The four selection sets of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    years: BTreeSet<i32>,
    classifications: BTreeSet<String>,
    causes: BTreeSet<String>,
    services: BTreeSet<String>,
    /// Generation of the dataset the selections were last reconciled against.
    generation: u64,
}

impl FilterState {
    /// Every available value selected in every dimension.
    pub fn all(dataset: &Dataset) -> Self {
        let available = dataset.available();
        Self {
            years: available.years.iter().copied().collect(),
            classifications: available.classifications.iter().cloned().collect(),
            causes: available.causes.iter().cloned().collect(),
            services: available.services.iter().cloned().collect(),
            generation: dataset.generation(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn years(&self) -> &BTreeSet<i32> {
        &self.years
    }

    /// Replace a selection set with `values`, keeping only those available
    /// for the dimension. Returns how many values were discarded.
    pub fn replace(
        &mut self,
        dimension: Dimension,
        values: &[FilterValue],
        available: &AvailableValues,
    ) -> usize {
        match dimension {
            Dimension::Year => {
                let (years, discarded) = pick(values, |v| {
                    v.as_year().filter(|y| available.years.contains(y))
                });
                self.years = years;
                discarded
            }
            Dimension::Classification => {
                let (picked, discarded) = pick_text(values, &available.classifications);
                self.classifications = picked;
                discarded
            }
            Dimension::Cause => {
                let (picked, discarded) = pick_text(values, &available.causes);
                self.causes = picked;
                discarded
            }
            Dimension::Service => {
                let (picked, discarded) = pick_text(values, &available.services);
                self.services = picked;
                discarded
            }
        }
    }

    pub fn select_all(&mut self, dimension: Dimension, available: &AvailableValues) {
        match dimension {
            Dimension::Year => self.years = available.years.iter().copied().collect(),
            Dimension::Classification => {
                self.classifications = available.classifications.iter().cloned().collect()
            }
            Dimension::Cause => self.causes = available.causes.iter().cloned().collect(),
            Dimension::Service => self.services = available.services.iter().cloned().collect(),
        }
    }

    pub fn select_none(&mut self, dimension: Dimension) {
        match dimension {
            Dimension::Year => self.years.clear(),
            Dimension::Classification => self.classifications.clear(),
            Dimension::Cause => self.causes.clear(),
            Dimension::Service => self.services.clear(),
        }
    }

    /// Drop selections that are no longer available after a reload.
    /// Returns true when the dataset generation changed.
    pub fn reconcile(&mut self, dataset: &Dataset) -> bool {
        if self.generation == dataset.generation() {
            return false;
        }
        let available = dataset.available();
        self.years.retain(|y| available.years.contains(y));
        self.classifications
            .retain(|v| available.classifications.contains(v));
        self.causes.retain(|v| available.causes.contains(v));
        self.services.retain(|v| available.services.contains(v));
        self.generation = dataset.generation();
        true
    }

    /// Current selection for `dimension`, ordered like its available values.
    pub fn selected(&self, dimension: Dimension, available: &AvailableValues) -> Vec<String> {
        match dimension {
            Dimension::Year => available
                .years
                .iter()
                .filter(|y| self.years.contains(y))
                .map(i32::to_string)
                .collect(),
            Dimension::Classification => in_order(&self.classifications, &available.classifications),
            Dimension::Cause => in_order(&self.causes, &available.causes),
            Dimension::Service => in_order(&self.services, &available.services),
        }
    }

    /// AND of the four membership predicates.
    pub fn matches(&self, record: &FatalityRecord) -> bool {
        self.years.contains(&record.year)
            && self.classifications.contains(record.classification.as_str())
            && self.causes.contains(record.cause.as_str())
            && self.services.contains(record.service.as_str())
    }
}

/// Keep the values `accept` maps to something; count the ones it rejects.
fn pick<T: Ord>(
    values: &[FilterValue],
    accept: impl Fn(&FilterValue) -> Option<T>,
) -> (BTreeSet<T>, usize) {
    let mut picked = BTreeSet::new();
    let mut discarded = 0;
    for value in values {
        match accept(value) {
            Some(v) => {
                picked.insert(v);
            }
            None => discarded += 1,
        }
    }
    (picked, discarded)
}

fn pick_text(values: &[FilterValue], available: &[String]) -> (BTreeSet<String>, usize) {
    pick(values, |v| {
        let text = v.as_text();
        available.contains(&text).then_some(text)
    })
}

fn in_order(selected: &BTreeSet<String>, available: &[String]) -> Vec<String> {
    available
        .iter()
        .filter(|v| selected.contains(v.as_str()))
        .cloned()
        .collect()
}

/// Records of a dataset that pass the current filters, in dataset order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    records: Vec<&'a FatalityRecord>,
}

impl<'a> FilteredView<'a> {
    #[cfg(test)]
    pub fn from_records(records: Vec<&'a FatalityRecord>) -> Self {
        Self { records }
    }

    #[cfg(test)]
    pub fn records(&self) -> &[&'a FatalityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a FatalityRecord> + '_ {
        self.records.iter().copied()
    }

    /// Narrow the view further without touching the dataset.
    pub fn retain_where(&self, predicate: impl Fn(&FatalityRecord) -> bool) -> FilteredView<'a> {
        FilteredView {
            records: self.iter().filter(|r| predicate(r)).collect(),
        }
    }
}

/// Apply all four selection sets to the dataset.
pub fn apply_filters<'a>(dataset: &'a Dataset, state: &FilterState) -> FilteredView<'a> {
    FilteredView {
        records: dataset.records().iter().filter(|r| state.matches(r)).collect(),
    }
}
