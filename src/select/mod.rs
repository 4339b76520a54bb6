//! Contains the `SeriesSelector`, which resolves a variable name against the raw and
//! daily stores and cuts out the points of a requested time window for plotting.

pub mod error;

use crate::day_number;
use crate::schema::DAY_NUMBER_FIELD;
use crate::select::error::SelectError;
use crate::store::daily_store::DailySeriesStore;
use crate::store::raw_store::RawSeriesStore;
use crate::time_range::TimeWindow;
use bon::bon;
use log::debug;
use std::borrow::Cow;

/// Which store a selection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesOrigin {
    Raw,
    Daily,
}

/// The time-restricted points of one variable, ready to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub name: String,
    pub unit: String,
    pub origin: SeriesOrigin,
    /// Epoch seconds of every point. For daily variables this is the bucket's
    /// earliest observation (`MinEpochtime`).
    pub timestamps: Vec<f64>,
    /// Day-number x positions: `ADdays` for raw points, `ADDailyDate` for daily ones.
    pub positions: Vec<f64>,
    pub values: Vec<f64>,
    /// With clamping, the first and last matching timestamp; otherwise the requested
    /// window.
    pub window: TimeWindow,
}

impl PlotSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(timestamp, value)` pairs in time order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }

    /// `(day-number, value)` pairs in time order.
    pub fn plot_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.positions.iter().copied().zip(self.values.iter().copied())
    }
}

/// Read-only view over both stores of one run.
#[derive(Debug, Clone, Copy)]
pub struct SeriesSelector<'a> {
    raw: &'a RawSeriesStore,
    daily: &'a DailySeriesStore,
}

#[bon]
impl<'a> SeriesSelector<'a> {
    pub fn new(raw: &'a RawSeriesStore, daily: &'a DailySeriesStore) -> Self {
        Self { raw, daily }
    }

    /// Selects the points of `variable` whose timestamp lies in the window.
    ///
    /// Raw variables take precedence over daily ones of the same name.
    ///
    /// * `.window(TimeWindow)`: inclusive epoch-second range to keep. Required.
    /// * `.clamp(bool)`: when `true` (the default) an empty result is an error and the
    ///   reported window shrinks to the matching points; when `false` the requested
    ///   window is reported as is and an empty result is allowed.
    ///
    /// # Errors
    ///
    /// * [`SelectError::NotFound`] if neither store holds `variable`.
    /// * [`SelectError::NoDataInRange`] if clamping and no point falls in the window.
    ///
    /// # Example
    ///
    /// ```
    /// use wxarchive::{aggregate, RawSeriesStore, SeriesSelector, TimeWindow, UnitRegistry};
    ///
    /// let units: UnitRegistry = [("Epochtime", "seconds"), ("OutTemp", "°F"), ("Rainfall", "inches")]
    ///     .into_iter()
    ///     .collect();
    /// let raw = RawSeriesStore::from_columns(
    ///     vec![
    ///         ("Epochtime".to_string(), vec![0.0, 600.0, 1_200.0]),
    ///         ("OutTemp".to_string(), vec![70.0, 71.0, 72.0]),
    ///         ("Rainfall".to_string(), vec![0.0, 0.0, 0.0]),
    ///     ],
    ///     &units,
    /// )?;
    /// let aggregated = aggregate(&raw, 0.25)?;
    ///
    /// let selector = SeriesSelector::new(&aggregated.raw, &aggregated.daily);
    /// let series = selector
    ///     .select_for_plot("OutTemp")
    ///     .window(TimeWindow::new(500.0, 5_000.0))
    ///     .call()?;
    /// assert_eq!(series.values, vec![71.0, 72.0]);
    /// assert_eq!(series.window, TimeWindow::new(600.0, 1_200.0));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[builder(start_fn = select_for_plot)]
    #[doc(hidden)]
    pub fn build_selection(
        &self,
        #[builder(start_fn)] variable: &str,
        window: TimeWindow,
        clamp: Option<bool>,
    ) -> Result<PlotSeries, SelectError> {
        let clamp = clamp.unwrap_or(true);

        let (origin, unit, timestamps, positions, values) = if self.raw.contains(variable) {
            let timestamps = self.raw.timestamps()?;
            let positions = if self.raw.contains(DAY_NUMBER_FIELD) {
                self.raw.series(DAY_NUMBER_FIELD)?
            } else {
                Cow::Owned(timestamps.iter().map(|&t| day_number::from_epoch(t)).collect())
            };
            (
                SeriesOrigin::Raw,
                self.raw.unit_of(variable),
                timestamps,
                positions,
                self.raw.series(variable)?,
            )
        } else if let Some(values) = self.daily.lookup(variable) {
            (
                SeriesOrigin::Daily,
                self.daily.unit_of(variable),
                Cow::Borrowed(self.daily.representative_timestamps()),
                Cow::Borrowed(self.daily.day_numbers()),
                Cow::Borrowed(values),
            )
        } else {
            return Err(SelectError::NotFound(variable.to_string()));
        };

        let matching: Vec<usize> = timestamps
            .iter()
            .enumerate()
            .filter(|(_, t)| window.contains(**t))
            .map(|(index, _)| index)
            .collect();
        debug!(
            "Selected {} of {} {:?} points for '{}'",
            matching.len(),
            timestamps.len(),
            origin,
            variable
        );

        let reported = match (matching.first(), matching.last()) {
            _ if !clamp => window,
            (Some(&first), Some(&last)) => TimeWindow::new(timestamps[first], timestamps[last]),
            _ => {
                return Err(SelectError::NoDataInRange {
                    variable: variable.to_string(),
                    requested: window,
                    available: available_range(&timestamps),
                })
            }
        };

        Ok(PlotSeries {
            name: variable.to_string(),
            unit: unit.unwrap_or_default().to_string(),
            origin,
            timestamps: matching.iter().map(|&i| timestamps[i]).collect(),
            positions: matching.iter().map(|&i| positions[i]).collect(),
            values: matching.iter().map(|&i| values[i]).collect(),
            window: reported,
        })
    }
}

fn available_range(timestamps: &[f64]) -> TimeWindow {
    let (start, end) = timestamps
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| {
            (lo.min(t), hi.max(t))
        });
    TimeWindow::new(start, end)
}
