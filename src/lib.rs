//! Daily summaries and charts from the `archive` table of a weather station's SQLite
//! database.
//!
//! Archive rows are read into a [`RawSeriesStore`], bucketed into adjusted calendar
//! days by the [`Aggregator`] (per-field daily maxima and minima plus rainfall totals)
//! and selected per variable and time window for plotting with [`SeriesSelector`].
//! [`WxArchive`] ties the stages together.

mod aggregate;
mod archive;
mod chart;
pub mod day_number;
mod error;
mod pipeline;
mod schema;
mod select;
mod store;
mod time_range;

pub use error::WxArchiveError;
pub use pipeline::*;

pub use aggregate::error::AggregateError;
pub use aggregate::{aggregate, Aggregated, Aggregator, DEFAULT_DAY_OFFSET};

pub use archive::error::ArchiveError;
pub use archive::{read_archive, ArchiveReader, ARCHIVE_TABLE};

pub use chart::error::ChartError;
pub use chart::ticks::TickPlan;
pub use chart::{
    draw_chart, render_chart, AxisGroup, ChartFormat, ChartSeries, ChartSpec, DEFAULT_DPI,
    DEFAULT_FIGURE_SIZE_IN, DEFAULT_OUTPUT,
};

pub use schema::*;

pub use select::error::SelectError;
pub use select::{PlotSeries, SeriesOrigin, SeriesSelector};

pub use store::daily_store::{
    AggregationKind, DailySeriesStore, DailyVariable, DayBucket, FieldExtremes,
};
pub use store::error::StoreError;
pub use store::raw_store::RawSeriesStore;

pub use time_range::{parse_in, parse_local, TimeRangeError, TimeWindow, LOCAL_TIME_FORMAT};
