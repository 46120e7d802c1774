//! Submission status tiers and the weeks-owed arithmetic behind them.
//!
//! Weeks are ISO week numbers. A last-filled week larger than the current
//! week belongs to the previous ISO year, which has either 52 or 53 weeks.
use crate::util::percent;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTier {
    Red,
    Orange,
    Yellow,
    Green,
}

impl StatusTier {
    /// Most severe first.
    pub const ALL: [StatusTier; 4] = [
        StatusTier::Red,
        StatusTier::Orange,
        StatusTier::Yellow,
        StatusTier::Green,
    ];

    /// `None` means nothing was ever submitted.
    pub fn classify(weeks_owed: Option<u32>) -> StatusTier {
        match weeks_owed {
            None => StatusTier::Red,
            Some(0) => StatusTier::Green,
            Some(1) => StatusTier::Yellow,
            Some(_) => StatusTier::Orange,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusTier::Red => "red",
            StatusTier::Orange => "orange",
            StatusTier::Yellow => "yellow",
            StatusTier::Green => "green",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusTier::Red => "Not Submitted",
            StatusTier::Orange => "2+ Weeks Late",
            StatusTier::Yellow => "1 Week Late",
            StatusTier::Green => "Up to Date",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            StatusTier::Red => "🔴",
            StatusTier::Orange => "🟠",
            StatusTier::Yellow => "🟡",
            StatusTier::Green => "🟢",
        }
    }

    pub fn colour(self) -> &'static str {
        match self {
            StatusTier::Red => "#dc2626",
            StatusTier::Orange => "#ea580c",
            StatusTier::Yellow => "#ca8a04",
            StatusTier::Green => "#16a34a",
        }
    }

    pub fn background(self) -> &'static str {
        match self {
            StatusTier::Red => "#fee2e2",
            StatusTier::Orange => "#ffedd5",
            StatusTier::Yellow => "#fef9c3",
            StatusTier::Green => "#dcfce7",
        }
    }
}

impl fmt::Display for StatusTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StatusTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(StatusTier::Red),
            "orange" => Ok(StatusTier::Orange),
            "yellow" => Ok(StatusTier::Yellow),
            "green" => Ok(StatusTier::Green),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Number of ISO weeks in `year` (52 or 53).
pub fn iso_weeks_in_year(year: i32) -> u32 {
    if NaiveDate::from_isoywd_opt(year, 53, Weekday::Mon).is_some() {
        53
    } else {
        52
    }
}

/// Today's ISO year and week.
pub fn current_iso_week() -> (i32, u32) {
    let week = chrono::Local::now().date_naive().iso_week();
    (week.year(), week.week())
}

/// Weeks owed as of `current_week` of ISO year `year`. A last week outside
/// 1..=53 is not a real submission and yields `None`.
pub fn calculate_weeks_owed_in(
    year: i32,
    current_week: u32,
    last_filled_week: Option<u32>,
) -> Option<u32> {
    let last = last_filled_week.filter(|w| (1..=53).contains(w))?;
    if last <= current_week {
        Some(current_week - last)
    } else {
        let prev_year_weeks = iso_weeks_in_year(year - 1);
        Some((current_week + prev_year_weeks).saturating_sub(last))
    }
}

/// Weeks owed relative to the current ISO year.
pub fn calculate_weeks_owed(current_week: u32, last_filled_week: Option<u32>) -> Option<u32> {
    let (year, _) = current_iso_week();
    calculate_weeks_owed_in(year, current_week, last_filled_week)
}

/// The ISO week reports are computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWeek {
    pub year: i32,
    pub week: u32,
}

impl ReportWeek {
    pub fn new(year: i32, week: u32) -> Self {
        ReportWeek { year, week }
    }

    pub fn today() -> Self {
        let (year, week) = current_iso_week();
        ReportWeek { year, week }
    }

    pub fn weeks_owed(&self, last_filled_week: Option<u32>) -> Option<u32> {
        calculate_weeks_owed_in(self.year, self.week, last_filled_week)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub red: usize,
    pub orange: usize,
    pub yellow: usize,
    pub green: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: StatusTier) {
        match status {
            StatusTier::Red => self.red += 1,
            StatusTier::Orange => self.orange += 1,
            StatusTier::Yellow => self.yellow += 1,
            StatusTier::Green => self.green += 1,
        }
    }

    pub fn get(&self, status: StatusTier) -> usize {
        match status {
            StatusTier::Red => self.red,
            StatusTier::Orange => self.orange,
            StatusTier::Yellow => self.yellow,
            StatusTier::Green => self.green,
        }
    }

    pub fn total(&self) -> usize {
        self.red + self.orange + self.yellow + self.green
    }

    /// Share of up-to-date entities in percent.
    pub fn compliance_rate(&self) -> f64 {
        percent(self.green, self.total())
    }
}

impl<'a> FromIterator<&'a StatusTier> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = &'a StatusTier>>(iter: I) -> Self {
        let mut counts = StatusCounts::default();
        for s in iter {
            counts.record(*s);
        }
        counts
    }
}
