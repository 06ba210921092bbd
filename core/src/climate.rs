//! Climate data provider
//!
//! The simulation core never parses climate files; it consumes this
//! contract. Columns follow the `rainfall_<field>` / `et_<field>` naming
//! convention, and lookups match on a partial field-name fragment. Missing
//! columns are a fatal lookup error, not a recoverable condition.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised by climate lookups
#[derive(Debug, Error, PartialEq)]
pub enum ClimateError {
    #[error("no climate column matches '{0}'")]
    MissingColumn(String),

    #[error("no climate record for {0}")]
    MissingDate(NaiveDate),

    #[error("season end date {end} cannot be earlier than start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Daily climate inputs for a named field.
pub trait ClimateProvider {
    /// Rainfall (mm) for the field on the given date.
    fn rainfall_on(&self, field: &str, date: NaiveDate) -> Result<f64, ClimateError>;

    /// Evapotranspiration (mm) for the field on the given date.
    fn et_on(&self, field: &str, date: NaiveDate) -> Result<f64, ClimateError>;

    /// Summed rainfall (mm) over the inclusive `[start, end]` range for
    /// columns matching the field-name fragment.
    fn seasonal_rainfall(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        fragment: &str,
    ) -> Result<f64, ClimateError>;

    /// Total rainfall (mm) across matching columns in a calendar year.
    fn annual_rainfall(&self, year: i32, fragment: &str) -> Result<f64, ClimateError> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1).expect("valid year start");
        let end = NaiveDate::from_ymd_opt(year, 12, 31).expect("valid year end");
        self.seasonal_rainfall(start, end, fragment)
    }
}

/// In-memory, date-indexed climate table.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use farm_simulator_core_rs::{ClimateProvider, ClimateTable};
///
/// let mut table = ClimateTable::new();
/// let day = NaiveDate::from_ymd_opt(1981, 5, 15).unwrap();
/// table.insert(day, "rainfall_field1", 12.0);
/// table.insert(day, "et_field1", 3.5);
///
/// assert_eq!(table.rainfall_on("field1", day).unwrap(), 12.0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClimateTable {
    /// Rows by date; each row maps column name to value
    rows: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
}

impl ClimateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one observation.
    pub fn insert(&mut self, date: NaiveDate, column: &str, value: f64) {
        self.rows
            .entry(date)
            .or_default()
            .insert(column.to_string(), value);
    }

    /// First and last dates in the table, if any data is loaded.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.rows.keys().next()?;
        let last = self.rows.keys().next_back()?;
        Some((*first, *last))
    }

    /// Look up a single (date, phenomenon, fragment) value.
    fn lookup(&self, prefix: &str, fragment: &str, date: NaiveDate) -> Result<f64, ClimateError> {
        let row = self.rows.get(&date).ok_or(ClimateError::MissingDate(date))?;

        // The phenomenon anchors the column name; the field fragment can
        // appear anywhere after it ("et" must not match "rainfall_beetroot")
        row.iter()
            .find(|(col, _)| col.starts_with(prefix) && col.contains(fragment))
            .map(|(_, v)| *v)
            .ok_or_else(|| ClimateError::MissingColumn(format!("{prefix}*{fragment}")))
    }
}

impl ClimateProvider for ClimateTable {
    fn rainfall_on(&self, field: &str, date: NaiveDate) -> Result<f64, ClimateError> {
        self.lookup("rainfall", field, date)
    }

    fn et_on(&self, field: &str, date: NaiveDate) -> Result<f64, ClimateError> {
        self.lookup("et", field, date)
    }

    fn seasonal_rainfall(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        fragment: &str,
    ) -> Result<f64, ClimateError> {
        if end < start {
            return Err(ClimateError::InvalidRange { start, end });
        }

        let mut rows_in_range = false;
        let mut matched = false;
        let mut total = 0.0;
        for (_, row) in self.rows.range(start..=end) {
            rows_in_range = true;
            for (col, v) in row {
                if col.starts_with("rainfall") && col.contains(fragment) {
                    matched = true;
                    total += v;
                }
            }
        }

        // A range with data but no matching column means a misnamed field
        if rows_in_range && !matched {
            return Err(ClimateError::MissingColumn(format!("rainfall*{fragment}")));
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table() -> ClimateTable {
        let mut t = ClimateTable::new();
        for (i, day) in [date(1981, 5, 15), date(1981, 5, 16), date(1981, 5, 17)]
            .into_iter()
            .enumerate()
        {
            t.insert(day, "rainfall_field1", 10.0 + i as f64);
            t.insert(day, "et_field1", 2.0);
            t.insert(day, "rainfall_field2", 1.0);
        }
        t
    }

    #[test]
    fn test_daily_lookup() {
        let t = table();
        assert_eq!(t.rainfall_on("field1", date(1981, 5, 16)).unwrap(), 11.0);
        assert_eq!(t.et_on("field1", date(1981, 5, 16)).unwrap(), 2.0);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let t = table();
        assert!(matches!(
            t.rainfall_on("field9", date(1981, 5, 16)),
            Err(ClimateError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_missing_date_is_fatal() {
        let t = table();
        assert!(matches!(
            t.rainfall_on("field1", date(1999, 1, 1)),
            Err(ClimateError::MissingDate(_))
        ));
    }

    #[test]
    fn test_seasonal_rainfall_inclusive_range() {
        let t = table();
        let total = t
            .seasonal_rainfall(date(1981, 5, 15), date(1981, 5, 17), "field1")
            .unwrap();
        assert_eq!(total, 10.0 + 11.0 + 12.0);
    }

    #[test]
    fn test_annual_rainfall_through_the_provider_contract() {
        let t = table();
        let provider: &dyn ClimateProvider = &t;
        assert_eq!(provider.annual_rainfall(1981, "field1").unwrap(), 33.0);
    }

    #[test]
    fn test_seasonal_rainfall_rejects_inverted_range() {
        let t = table();
        assert!(matches!(
            t.seasonal_rainfall(date(1981, 5, 17), date(1981, 5, 15), "field1"),
            Err(ClimateError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_phenomenon_prefix_anchored_at_column_start() {
        // A field name containing "et" must not turn its rainfall column
        // into an evapotranspiration match
        let mut t = ClimateTable::new();
        let day = date(1981, 5, 15);
        t.insert(day, "rainfall_beetroot", 7.0);

        assert_eq!(t.rainfall_on("beetroot", day).unwrap(), 7.0);
        assert_eq!(
            t.et_on("beetroot", day),
            Err(ClimateError::MissingColumn("et*beetroot".to_string()))
        );

        t.insert(day, "et_beetroot", 2.0);
        assert_eq!(t.et_on("beetroot", day).unwrap(), 2.0);
    }

    #[test]
    fn test_fragment_matches_one_field_only() {
        let t = table();
        let total = t
            .seasonal_rainfall(date(1981, 5, 15), date(1981, 5, 17), "field2")
            .unwrap();
        assert_eq!(total, 3.0);
    }
}
