//! Requested time ranges: parsing local wall-clock bounds and converting them to the
//! epoch-second [`TimeWindow`] the selection helper filters on.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::fmt;
use thiserror::Error;

/// Format of the `--start` / `--end` arguments.
pub const LOCAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const LOCAL_TIME_EXAMPLE: &str = "2017-07-04T08:30:00";

#[derive(Debug, Error)]
pub enum TimeRangeError {
    #[error("Time '{input}' is not in the format YYYY-MM-DDTHH:MM:SS (e.g. {example})", example = LOCAL_TIME_EXAMPLE)]
    Format {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Local time '{0}' does not exist or is ambiguous in the host time zone")]
    Ambiguous(NaiveDateTime),

    #[error("Start time {start} is after end time {end}")]
    Reversed {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Parses `YYYY-MM-DDTHH:MM:SS` as a wall-clock time in `tz`.
pub fn parse_in<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<DateTime<Tz>, TimeRangeError> {
    let naive = NaiveDateTime::parse_from_str(input.trim(), LOCAL_TIME_FORMAT).map_err(
        |source| TimeRangeError::Format {
            input: input.to_string(),
            source,
        },
    )?;
    tz.from_local_datetime(&naive)
        .single()
        .ok_or(TimeRangeError::Ambiguous(naive))
}

/// Parses `YYYY-MM-DDTHH:MM:SS` in the host's local time zone.
pub fn parse_local(input: &str) -> Result<DateTime<Local>, TimeRangeError> {
    parse_in(input, &Local)
}

/// Inclusive window of epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Window between two instants in any time zone.
    ///
    /// # Errors
    ///
    /// Returns [`TimeRangeError::Reversed`] if `start` is after `end`.
    pub fn between<Tz: TimeZone>(
        start: DateTime<Tz>,
        end: DateTime<Tz>,
    ) -> Result<Self, TimeRangeError> {
        let (start, end) = (start.with_timezone(&Utc), end.with_timezone(&Utc));
        if start > end {
            return Err(TimeRangeError::Reversed { start, end });
        }
        Ok(Self::new(to_epoch_seconds(start), to_epoch_seconds(end)))
    }

    /// Window between two local `YYYY-MM-DDTHH:MM:SS` strings.
    pub fn parse_local(start: &str, end: &str) -> Result<Self, TimeRangeError> {
        Self::between(parse_local(start)?, parse_local(end)?)
    }

    pub fn contains(&self, epoch_seconds: f64) -> bool {
        self.start <= epoch_seconds && epoch_seconds <= self.end
    }

    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start) / 3_600.0
    }

    /// Smallest window covering both.
    pub fn union(&self, other: &TimeWindow) -> TimeWindow {
        TimeWindow::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn start_utc(&self) -> Option<DateTime<Utc>> {
        from_epoch_seconds(self.start)
    }

    pub fn end_utc(&self) -> Option<DateTime<Utc>> {
        from_epoch_seconds(self.end)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start_utc(), self.end_utc()) {
            (Some(start), Some(end)) => write!(
                f,
                "{} to {}",
                start.format("%Y-%m-%d %H:%M:%S UTC"),
                end.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            _ => write!(f, "{} to {} (epoch seconds)", self.start, self.end),
        }
    }
}

pub fn to_epoch_seconds(datetime: DateTime<Utc>) -> f64 {
    datetime.timestamp() as f64 + f64::from(datetime.timestamp_subsec_nanos()) / 1e9
}

pub fn from_epoch_seconds(epoch_seconds: f64) -> Option<DateTime<Utc>> {
    if !epoch_seconds.is_finite() {
        return None;
    }
    let secs = epoch_seconds.floor();
    let nanos = ((epoch_seconds - secs) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(secs as i64, nanos)
}
