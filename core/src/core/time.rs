//! Time management for the simulation
//!
//! The simulation operates on real calendar dates at daily granularity.
//! Crop plant dates recur yearly (month/day), so the clock tracks a
//! `NaiveDate` cursor plus a monotonic yearly step counter used by the
//! maintenance-cost model.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Tracks the current simulated day and the yearly timestep counter
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use farm_simulator_core_rs::SimClock;
///
/// let start = NaiveDate::from_ymd_opt(1981, 12, 31).unwrap();
/// let mut clock = SimClock::new(start);
/// assert_eq!(clock.year_step(), 1);
///
/// clock.advance_day();
/// assert_eq!(clock.year_step(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimClock {
    /// The day currently being processed
    current_date: NaiveDate,
    /// Yearly timestep counter, starting at 1; increments when a
    /// December 31 is crossed and is monotonic
    year_step: usize,
}

impl SimClock {
    /// Create a clock positioned on `start_date` with `year_step` 1.
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            current_date: start_date,
            year_step: 1,
        }
    }

    /// The day currently being processed.
    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    /// Yearly timestep counter (1-indexed).
    pub fn year_step(&self) -> usize {
        self.year_step
    }

    /// Advance to the next day.
    ///
    /// The year step increments only on the day-of-year boundary
    /// (month = 12, day = 31).
    pub fn advance_day(&mut self) {
        if self.current_date.month() == 12 && self.current_date.day() == 31 {
            self.year_step += 1;
        }
        self.current_date += Duration::days(1);
    }
}

/// True if `date` falls on the given recurring month/day (year-agnostic).
pub fn matches_month_day(date: NaiveDate, month: u32, day: u32) -> bool {
    date.month() == month && date.day() == day
}
