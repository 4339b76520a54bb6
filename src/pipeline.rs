//! The main entry point: read an archive, aggregate it into daily values, then chart
//! or export the results.

use crate::aggregate::{Aggregator, DEFAULT_DAY_OFFSET};
use crate::archive::read_archive;
use crate::chart::{render_chart, AxisGroup, ChartSeries, ChartSpec, DEFAULT_OUTPUT};
use crate::error::WxArchiveError;
use crate::select::SeriesSelector;
use crate::store::daily_store::DailySeriesStore;
use crate::store::raw_store::RawSeriesStore;
use crate::time_range::TimeWindow;
use bon::bon;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Wall-clock time spent in each stage of a run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineTimings {
    started: Instant,
    pub read: Duration,
    pub aggregate: Duration,
    pub daily_table: Option<Duration>,
    pub chart: Option<Duration>,
}

impl PipelineTimings {
    fn start() -> Self {
        Self {
            started: Instant::now(),
            read: Duration::ZERO,
            aggregate: Duration::ZERO,
            daily_table: None,
            chart: None,
        }
    }

    /// Time since the run started.
    pub fn total(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn log(&self) {
        debug!("Time to read the archive: {:?}", self.read);
        debug!("Time to compute daily values: {:?}", self.aggregate);
        if let Some(daily_table) = self.daily_table {
            debug!("Time to write the daily table: {:?}", daily_table);
        }
        if let Some(chart) = self.chart {
            debug!("Time to draw the chart: {:?}", chart);
        }
        debug!("Time for the whole run: {:?}", self.total());
    }
}

/// Outcome of [`WxArchive::plot`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlotReport {
    pub output: PathBuf,
    pub window: TimeWindow,
    pub drawn: Vec<String>,
    /// Variables left out because they were unknown or had no data in range.
    pub skipped: Vec<String>,
}

/// Series chosen for one chart, before drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSelection {
    pub series: Vec<ChartSeries>,
    pub skipped: Vec<String>,
    /// The requested window, or with clamping the union of the series' windows.
    pub window: TimeWindow,
}

impl PlotSelection {
    /// Names of the series that have points to draw, in request order.
    pub fn drawn(&self) -> Vec<String> {
        self.series
            .iter()
            .filter(|item| !item.series.is_empty())
            .map(|item| item.series.name.clone())
            .collect()
    }
}

/// Raw and daily series of one weather station archive.
///
/// # Examples
///
/// ```no_run
/// use wxarchive::{TimeWindow, WxArchive, WxArchiveError};
///
/// # fn main() -> Result<(), WxArchiveError> {
/// let mut archive = WxArchive::open("weewx.sdb").day_offset(0.25).call()?;
/// let window = TimeWindow::parse_local("2017-07-02T19:00:00", "2017-07-05T19:00:00")?;
///
/// let report = archive
///     .plot(window)
///     .primary(vec!["OutTemp".to_string(), "Dewpoint".to_string()])
///     .secondary(vec!["Rain4Day".to_string()])
///     .output("july.png".into())
///     .call()?;
/// println!("Drew {:?} to {:?}", report.drawn, report.output);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WxArchive {
    raw: RawSeriesStore,
    daily: DailySeriesStore,
    day_offset: f64,
    timings: PipelineTimings,
}

#[bon]
impl WxArchive {
    /// Reads the archive at `path` and aggregates it.
    ///
    /// * `.day_offset(f64)`: fraction of a day past UTC midnight at which a day starts.
    ///   Defaults to 0.25 (06 UTC).
    ///
    /// Finish with `.call()`.
    #[builder(start_fn = open)]
    #[doc(hidden)]
    pub fn build_open(
        #[builder(start_fn)] path: &str,
        day_offset: Option<f64>,
    ) -> Result<Self, WxArchiveError> {
        Self::open_path(Path::new(path), day_offset.unwrap_or(DEFAULT_DAY_OFFSET))
    }

    /// Plots variables over a time window.
    ///
    /// * `.primary(Vec<String>)`: variables drawn against the left axis. Required.
    /// * `.secondary(Vec<String>)`: variables drawn against the right axis.
    /// * `.clamp(bool)`: with `true` (the default) variables without data in the
    ///   window are skipped and the x axis fits the data; with `false` the x axis is
    ///   the literal window.
    /// * `.output(PathBuf)`: `.svg` or bitmap file. Defaults to `wx_chart.png`.
    ///
    /// Unknown variables and variables without data in range are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// * [`WxArchiveError::NothingToPlot`] if no variable is left to draw.
    /// * [`WxArchiveError::Chart`] if the chart cannot be drawn.
    #[builder(start_fn = plot)]
    #[doc(hidden)]
    pub fn build_plot(
        &mut self,
        #[builder(start_fn)] window: TimeWindow,
        primary: Vec<String>,
        secondary: Option<Vec<String>>,
        clamp: Option<bool>,
        output: Option<PathBuf>,
    ) -> Result<PlotReport, WxArchiveError> {
        let started = Instant::now();
        let clamp = clamp.unwrap_or(true);
        let output = output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
        let requested: Vec<(String, AxisGroup)> = primary
            .into_iter()
            .map(|name| (name, AxisGroup::Primary))
            .chain(
                secondary
                    .unwrap_or_default()
                    .into_iter()
                    .map(|name| (name, AxisGroup::Secondary)),
            )
            .collect();

        let selection = self.select_series(&requested, window, clamp)?;
        let drawn = selection.drawn();
        let PlotSelection {
            series,
            skipped,
            window: chart_window,
        } = selection;

        let spec = ChartSpec::builder()
            .series(series)
            .window(chart_window)
            .fixed_window(!clamp)
            .build()?;
        render_chart(&spec, &output)?;
        self.timings.chart = Some(started.elapsed());

        Ok(PlotReport {
            output,
            window: chart_window,
            drawn,
            skipped,
        })
    }
}

impl WxArchive {
    /// Selects every requested variable over `window`.
    ///
    /// Unknown variables and variables without data in range are skipped with a
    /// warning; any other selection error is returned.
    ///
    /// # Errors
    ///
    /// [`WxArchiveError::NothingToPlot`] if no variable has points to draw.
    pub fn select_series(
        &self,
        requested: &[(String, AxisGroup)],
        window: TimeWindow,
        clamp: bool,
    ) -> Result<PlotSelection, WxArchiveError> {
        let selector = self.selector();
        let mut series = Vec::with_capacity(requested.len());
        let mut skipped = Vec::new();
        for (name, axis) in requested {
            match selector
                .select_for_plot(name)
                .window(window)
                .clamp(clamp)
                .call()
            {
                Ok(selection) => series.push(ChartSeries::new(selection, *axis)),
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping '{}': {}", name, e);
                    skipped.push(name.clone());
                }
                Err(e) => return Err(e.into()),
            }
        }
        if series.iter().all(|item| item.series.is_empty()) {
            return Err(WxArchiveError::NothingToPlot(
                requested.iter().map(|(name, _)| name.clone()).collect(),
            ));
        }

        let window = if clamp {
            series
                .iter()
                .filter(|item| !item.series.is_empty())
                .map(|item| item.series.window)
                .reduce(|a, b| a.union(&b))
                .unwrap_or(window)
        } else {
            window
        };
        debug!(
            "Selected {} series over {} ({} skipped)",
            series.len(),
            window,
            skipped.len()
        );
        Ok(PlotSelection {
            series,
            skipped,
            window,
        })
    }

    /// Reads and aggregates the archive at `path`.
    pub fn open_path(path: &Path, day_offset: f64) -> Result<Self, WxArchiveError> {
        let mut timings = PipelineTimings::start();
        let aggregator = Aggregator::builder().day_offset(day_offset).build()?;

        let raw = read_archive(path)?;
        timings.read = timings.total();

        Self::aggregate_with(raw, &aggregator, timings)
    }

    /// Aggregates an already loaded raw store.
    pub fn from_raw(raw: RawSeriesStore, day_offset: f64) -> Result<Self, WxArchiveError> {
        let aggregator = Aggregator::builder().day_offset(day_offset).build()?;
        Self::aggregate_with(raw, &aggregator, PipelineTimings::start())
    }

    fn aggregate_with(
        raw: RawSeriesStore,
        aggregator: &Aggregator,
        mut timings: PipelineTimings,
    ) -> Result<Self, WxArchiveError> {
        let started = Instant::now();
        let aggregated = aggregator.aggregate(&raw)?;
        timings.aggregate = started.elapsed();
        info!(
            "Aggregated {} observations into {} days",
            aggregated.raw.len(),
            aggregated.daily.len()
        );
        Ok(Self {
            raw: aggregated.raw,
            daily: aggregated.daily,
            day_offset: aggregator.day_offset(),
            timings,
        })
    }

    /// The raw store, including `ADdays` and `CumulativeRain`.
    pub fn raw(&self) -> &RawSeriesStore {
        &self.raw
    }

    pub fn daily(&self) -> &DailySeriesStore {
        &self.daily
    }

    pub fn day_offset(&self) -> f64 {
        self.day_offset
    }

    pub fn timings(&self) -> &PipelineTimings {
        &self.timings
    }

    pub fn selector(&self) -> SeriesSelector<'_> {
        SeriesSelector::new(&self.raw, &self.daily)
    }

    /// Writes the daily table to `path` as CSV.
    pub fn write_daily_csv(&mut self, path: &Path) -> Result<(), WxArchiveError> {
        let started = Instant::now();
        self.daily.write_csv(path)?;
        self.timings.daily_table = Some(started.elapsed());
        Ok(())
    }
}
