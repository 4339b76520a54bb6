//! x-axis ticks for a plotted duration, placed on calendar boundaries.

use crate::day_number;
use chrono::{Datelike, NaiveDate};
use std::ops::Range;

// Upper bound on generated ticks or scanned days for one axis.
const MAX_TICKS: usize = 10_000;
const MAX_SCANNED_DAYS: usize = 200 * 366;

/// Where ticks fall on the UTC calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickRule {
    /// Every `n` hours counted from midnight.
    Hours(u32),
    /// Midnight of the days of the month that are multiples of `n`.
    MonthDays(u32),
    /// The first of the months that are multiples of `n`.
    Months(u32),
}

impl TickRule {
    /// Tick positions within `range`, in day-numbers, ascending.
    pub fn points(self, range: &Range<f64>) -> Vec<f64> {
        if !(range.start.is_finite() && range.end.is_finite()) || range.end < range.start {
            return Vec::new();
        }
        match self {
            TickRule::Hours(step) => {
                let step = i64::from(step.max(1));
                let first = (range.start * 24.0).ceil() as i64;
                let first = first + (step - first.rem_euclid(step)) % step;
                let last = (range.end * 24.0).floor() as i64;
                (first..=last)
                    .step_by(step as usize)
                    .take(MAX_TICKS)
                    .map(|hour| hour as f64 / 24.0)
                    .collect()
            }
            TickRule::MonthDays(step) => calendar_days(range)
                .filter(|(_, date)| date.day() % step.max(1) == 0)
                .map(|(day, _)| day)
                .take(MAX_TICKS)
                .collect(),
            TickRule::Months(step) => calendar_days(range)
                .filter(|(_, date)| date.day() == 1 && date.month() % step.max(1) == 0)
                .map(|(day, _)| day)
                .take(MAX_TICKS)
                .collect(),
        }
    }
}

fn calendar_days(range: &Range<f64>) -> impl Iterator<Item = (f64, NaiveDate)> {
    let first = range.start.ceil() as i64;
    let last = range.end.floor() as i64;
    (first..=last)
        .take(MAX_SCANNED_DAYS)
        .filter_map(|day| day_number::to_date(day as f64).map(|date| (day as f64, date)))
}

/// Labelled (major) and unlabelled (minor) tick rules for a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    pub major: TickRule,
    pub minor: TickRule,
}

impl TickPlan {
    /// Picks the ticks for a window of `hours`:
    ///
    /// | duration  | labelled                 | minor              |
    /// |-----------|--------------------------|--------------------|
    /// | ≤ 48 h    | midnight                 | hourly             |
    /// | ≤ 168 h   | midnight                 | 6-hourly           |
    /// | ≤ 336 h   | midnight                 | 12-hourly          |
    /// | ≤ 744 h   | the 7th, 14th, 21st, 28th| midnight           |
    /// | longer    | 1st of even months       | 1st of every month |
    pub fn for_duration(hours: f64) -> Self {
        let (major, minor) = if hours <= 48.0 {
            (TickRule::Hours(24), TickRule::Hours(1))
        } else if hours <= 168.0 {
            (TickRule::Hours(24), TickRule::Hours(6))
        } else if hours <= 336.0 {
            (TickRule::Hours(24), TickRule::Hours(12))
        } else if hours <= 744.0 {
            (TickRule::MonthDays(7), TickRule::Hours(24))
        } else {
            (TickRule::Months(2), TickRule::Months(1))
        };
        Self { major, minor }
    }
}

/// `%m/%d` label of the UTC calendar date containing `day`.
pub fn day_label(day: f64) -> String {
    day_number::to_datetime(day)
        .map(|datetime| datetime.format("%m/%d").to_string())
        .unwrap_or_default()
}
