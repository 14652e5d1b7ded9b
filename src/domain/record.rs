// Fatality record and dataset domain models
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// One fatality event after sanitation.
#[derive(Debug, Clone, PartialEq)]
pub struct FatalityRecord {
    pub year: i32,
    pub cause: String,
    pub classification: String,
    pub age: f64,
    pub rank: String,
    pub service: String,
    pub location_type: String,
    pub nature: String,
}

/// A cell as it comes out of the store, before numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl RawCell {
    /// Numeric coercion: anything unparseable becomes `None`.
    pub fn to_number(&self) -> Option<f64> {
        let value = match self {
            RawCell::Null => return None,
            RawCell::Integer(i) => *i as f64,
            RawCell::Real(f) => *f,
            RawCell::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// An unsanitised row read from the fatality table.
#[derive(Debug, Clone)]
pub struct RawFatalityRow {
    pub year: RawCell,
    pub age: RawCell,
    pub cause: Option<String>,
    pub classification: Option<String>,
    pub rank: Option<String>,
    pub service: Option<String>,
    pub location_type: Option<String>,
    pub nature: Option<String>,
}

impl RawFatalityRow {
    /// Coerce the numeric columns and fill missing text with `sentinel`.
    /// Returns `None` when year or age is missing after coercion.
    pub fn sanitize(self, sentinel: &str) -> Option<FatalityRecord> {
        let year = self.year.to_number()?;
        let age = self.age.to_number()?;
        if year < i32::MIN as f64 || year > i32::MAX as f64 {
            return None;
        }

        let fill = |v: Option<String>| v.unwrap_or_else(|| sentinel.to_string());
        Some(FatalityRecord {
            year: year.trunc() as i32,
            cause: fill(self.cause),
            classification: fill(self.classification),
            age,
            rank: fill(self.rank),
            service: fill(self.service),
            location_type: fill(self.location_type),
            nature: fill(self.nature),
        })
    }
}

/// Distinct values per filterable dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailableValues {
    /// Sorted ascending.
    pub years: Vec<i32>,
    /// The text dimensions keep first-appearance order.
    pub classifications: Vec<String>,
    pub causes: Vec<String>,
    pub services: Vec<String>,
}

impl AvailableValues {
    fn collect(records: &[FatalityRecord]) -> Self {
        let mut years: Vec<i32> = records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();

        Self {
            years,
            classifications: distinct_in_order(records.iter().map(|r| r.classification.as_str())),
            causes: distinct_in_order(records.iter().map(|r| r.cause.as_str())),
            services: distinct_in_order(records.iter().map(|r| r.service.as_str())),
        }
    }
}

fn distinct_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// Immutable snapshot of the fatality table for one cache window.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<FatalityRecord>,
    available: AvailableValues,
    generation: u64,
    loaded_at: DateTime<Utc>,
}

impl Dataset {
    pub fn new(records: Vec<FatalityRecord>, generation: u64, loaded_at: DateTime<Utc>) -> Self {
        let available = AvailableValues::collect(&records);
        Self {
            records,
            available,
            generation,
            loaded_at,
        }
    }

    /// Sanitize raw rows, dropping those without a numeric year and age.
    /// Returns the dataset and the number of dropped rows.
    pub fn from_raw_rows(
        rows: Vec<RawFatalityRow>,
        sentinel: &str,
        generation: u64,
        loaded_at: DateTime<Utc>,
    ) -> (Self, usize) {
        let total = rows.len();
        let records: Vec<FatalityRecord> = rows
            .into_iter()
            .filter_map(|row| row.sanitize(sentinel))
            .collect();
        let dropped = total - records.len();
        (Self::new(records, generation, loaded_at), dropped)
    }

    pub fn records(&self) -> &[FatalityRecord] {
        &self.records
    }

    pub fn available(&self) -> &AvailableValues {
        &self.available
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_to_number_coercion() {
        assert_eq!(RawCell::Integer(42).to_number(), Some(42.0));
        assert_eq!(RawCell::Real(31.5).to_number(), Some(31.5));
        assert_eq!(RawCell::Text(" 2019 ".to_string()).to_number(), Some(2019.0));
        assert_eq!(RawCell::Text("forty".to_string()).to_number(), None);
        assert_eq!(RawCell::Text("NaN".to_string()).to_number(), None);
        assert_eq!(RawCell::Real(f64::INFINITY).to_number(), None);
        assert_eq!(RawCell::Null.to_number(), None);
    }

    #[test]
    fn test_non_numeric_age_is_dropped() {
        let rows = vec![
            raw_row(RawCell::Integer(2019), RawCell::Text("unknown".to_string()), Some("Fall")),
            raw_row(RawCell::Integer(2019), RawCell::Integer(35), Some("Fall")),
        ];
        let (dataset, dropped) = Dataset::from_raw_rows(rows, "Unknown", 1, Utc::now());

        assert_eq!(dropped, 1);
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].age, 35.0);
    }

    #[test]
    fn test_missing_year_is_dropped() {
        let rows = vec![raw_row(RawCell::Null, RawCell::Integer(35), Some("Fall"))];
        let (dataset, dropped) = Dataset::from_raw_rows(rows, "Unknown", 1, Utc::now());
        assert!(dataset.is_empty());
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_null_cause_gets_sentinel() {
        let rows = vec![raw_row(RawCell::Text("2020".to_string()), RawCell::Real(28.0), None)];
        let (dataset, _) = Dataset::from_raw_rows(rows, "Desconhecido", 1, Utc::now());

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].cause, "Desconhecido");
        assert_eq!(dataset.records()[0].year, 2020);
    }

    #[test]
    fn test_fractional_year_truncates() {
        let rows = vec![raw_row(RawCell::Real(2018.9), RawCell::Integer(50), Some("Burns"))];
        let (dataset, _) = Dataset::from_raw_rows(rows, "Unknown", 1, Utc::now());
        assert_eq!(dataset.records()[0].year, 2018);
    }

    #[test]
    fn test_available_values_ordering() {
        let dataset = dataset(vec![
            record(2020, "Stress", "Volunteer", "Municipal"),
            record(2018, "Fall", "Career", "Wildland"),
            record(2020, "Stress", "Career", "Municipal"),
            record(2019, "Burns", "Volunteer", "Municipal"),
        ]);
        let available = dataset.available();

        assert_eq!(available.years, vec![2018, 2019, 2020]);
        assert_eq!(available.causes, vec!["Stress", "Fall", "Burns"]);
        assert_eq!(available.classifications, vec!["Volunteer", "Career"]);
        assert_eq!(available.services, vec!["Municipal", "Wildland"]);
    }
}
