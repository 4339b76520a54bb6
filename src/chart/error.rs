use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Nothing to draw: no series has points in the plotted window")]
    NoSeries,

    #[error("Invalid figure size {width_in}x{height_in} in at {dpi} dpi")]
    InvalidFigure {
        width_in: f64,
        height_in: f64,
        dpi: u32,
    },

    #[error("Failed to draw chart '{path}': {message}")]
    Draw { path: PathBuf, message: String },
}
