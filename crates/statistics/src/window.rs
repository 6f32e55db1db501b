//! Month window policies.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, StatisticsError};

/// How a calendar month maps to a `[start, end)` timestamp range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MonthWindow {
    /// `[first of month, first of next month)`.
    ///
    /// Every instant of the year falls in exactly one month.
    #[default]
    Calendar,

    /// `[first of month, "day 31" of month)` where day 31 overflows into
    /// the next month for short months.
    ///
    /// For February 2024 the end is March 2, so rows from March 1 count in
    /// both February and March. Rows created on the 31st of a long month
    /// are counted nowhere.
    LegacyDay31,
}

impl MonthWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonthWindow::Calendar => "calendar",
            MonthWindow::LegacyDay31 => "legacy-day31",
        }
    }

    /// Returns the half-open UTC range for `month` (1..=12) of `year`.
    pub fn bounds(&self, year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let invalid = || StatisticsError::InvalidWindow { year, month };

        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let end = match self {
            MonthWindow::Calendar => {
                let (next_year, next_month) = if month == 12 {
                    (year + 1, 1)
                } else {
                    (year, month + 1)
                };
                NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(invalid)?
            }
            MonthWindow::LegacyDay31 => first
                .checked_add_signed(Duration::days(30))
                .ok_or_else(invalid)?,
        };

        let start = first.and_hms_opt(0, 0, 0).ok_or_else(invalid)?.and_utc();
        let end = end.and_hms_opt(0, 0, 0).ok_or_else(invalid)?.and_utc();
        Ok((start, end))
    }
}

impl fmt::Display for MonthWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a window name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown month window: {0} (expected calendar or legacy-day31)")]
pub struct UnknownWindow(pub String);

impl FromStr for MonthWindow {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calendar" => Ok(MonthWindow::Calendar),
            "legacy-day31" | "legacy_day31" => Ok(MonthWindow::LegacyDay31),
            other => Err(UnknownWindow(other.to_string())),
        }
    }
}
