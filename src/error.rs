use crate::aggregate::error::AggregateError;
use crate::archive::error::ArchiveError;
use crate::chart::error::ChartError;
use crate::select::error::SelectError;
use crate::store::error::StoreError;
use crate::time_range::TimeRangeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WxArchiveError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Select(#[from] SelectError),

    #[error(transparent)]
    TimeRange(#[from] TimeRangeError),

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error("None of the requested variables ({}) has data to plot", .0.join(", "))]
    NothingToPlot(Vec<String>),
}
