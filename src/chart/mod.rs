//! Time-series chart rendering with plotters: one primary and an optional secondary
//! y axis over a shared day-number x axis.

pub mod error;
pub mod ticks;

use crate::chart::error::ChartError;
use crate::chart::ticks::{day_label, TickPlan};
use crate::day_number;
use crate::schema::DAILY_RAIN_FIELD;
use crate::select::PlotSeries;
use crate::time_range::TimeWindow;
use bon::bon;
use chrono::{Local, TimeZone};
use log::{debug, info, warn};
use plotters::coord::combinators::BindKeyPoints;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt::Display;
use std::ops::Range;
use std::path::Path;

pub const DEFAULT_OUTPUT: &str = "wx_chart.png";
pub const DEFAULT_FIGURE_SIZE_IN: (f64, f64) = (6.4, 3.6);
pub const DEFAULT_DPI: u32 = 200;

// Daily rainfall bars sit a third of a day left of the bucket's day-number.
const BAR_SHIFT_DAYS: f64 = 0.33;
const BAR_WIDTH_DAYS: f64 = 0.8;
// Wider polylines spike past the plot area at sharp reversals.
const LINE_WIDTH_PX: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisGroup {
    #[default]
    Primary,
    Secondary,
}

/// A selected series and the y axis it is drawn against.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub series: PlotSeries,
    pub axis: AxisGroup,
}

impl ChartSeries {
    pub fn new(series: PlotSeries, axis: AxisGroup) -> Self {
        Self { series, axis }
    }

    /// Daily rainfall totals are drawn as bars, everything else as lines.
    pub fn is_bars(&self) -> bool {
        self.series.name == DAILY_RAIN_FIELD
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    Bitmap,
    Svg,
}

impl ChartFormat {
    /// `.svg` (any case) selects SVG; every other extension goes to the bitmap encoder.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => ChartFormat::Svg,
            _ => ChartFormat::Bitmap,
        }
    }
}

/// Everything needed to draw one chart.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    series: Vec<ChartSeries>,
    window: TimeWindow,
    fixed_window: bool,
    pixels: (u32, u32),
    dpi: u32,
}

#[bon]
impl ChartSpec {
    /// Creates a chart description.
    ///
    /// * `.series(Vec<ChartSeries>)`: the series to draw. Empty ones are skipped with a
    ///   warning.
    /// * `.window(TimeWindow)`: the plotted time range.
    /// * `.fixed_window(bool)`: when `true` the x axis spans exactly `window`; otherwise
    ///   (the default) it is widened to cover every drawn point and bar.
    /// * `.figure_size_in((f64, f64))`: width and height in inches. Defaults to 6.4×3.6.
    /// * `.dpi(u32)`: pixels per inch. Defaults to 200.
    ///
    /// # Errors
    ///
    /// * [`ChartError::NoSeries`] if no series has any points.
    /// * [`ChartError::InvalidFigure`] if the pixel size would be zero or not finite.
    #[builder]
    pub fn new(
        series: Vec<ChartSeries>,
        window: TimeWindow,
        fixed_window: Option<bool>,
        figure_size_in: Option<(f64, f64)>,
        dpi: Option<u32>,
    ) -> Result<Self, ChartError> {
        let (width_in, height_in) = figure_size_in.unwrap_or(DEFAULT_FIGURE_SIZE_IN);
        let dpi = dpi.unwrap_or(DEFAULT_DPI);
        let width = (width_in * f64::from(dpi)).round();
        let height = (height_in * f64::from(dpi)).round();
        let fits = |pixels: f64| (1.0..=f64::from(u32::MAX)).contains(&pixels);
        if !(fits(width) && fits(height)) {
            return Err(ChartError::InvalidFigure {
                width_in,
                height_in,
                dpi,
            });
        }

        let series: Vec<ChartSeries> = series
            .into_iter()
            .filter(|item| {
                if item.series.is_empty() {
                    warn!("No '{}' data in the plotted window; skipping it", item.series.name);
                }
                !item.series.is_empty()
            })
            .collect();
        if series.is_empty() {
            return Err(ChartError::NoSeries);
        }

        Ok(Self {
            series,
            window,
            fixed_window: fixed_window.unwrap_or(false),
            pixels: (width as u32, height as u32),
            dpi,
        })
    }
}

impl ChartSpec {
    pub fn series(&self) -> &[ChartSeries] {
        &self.series
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        self.pixels
    }

    pub fn has_secondary(&self) -> bool {
        self.series.iter().any(|s| s.axis == AxisGroup::Secondary)
    }

    /// Day-number range of the x axis.
    pub fn x_range(&self) -> Range<f64> {
        let mut start = day_number::from_epoch(self.window.start);
        let mut end = day_number::from_epoch(self.window.end);
        if !self.fixed_window {
            for item in &self.series {
                for &day in &item.series.positions {
                    let (left, right) = if item.is_bars() {
                        bar_extent(day)
                    } else {
                        (day, day)
                    };
                    start = start.min(left);
                    end = end.max(right);
                }
            }
        }
        if end > start {
            start..end
        } else {
            start - 0.5..start + 0.5
        }
    }

    /// Padded value range of one axis group, or `None` if nothing is drawn against it.
    /// Axes carrying bars always include zero.
    pub fn y_range(&self, axis: AxisGroup) -> Option<Range<f64>> {
        let members: Vec<&ChartSeries> = self.series.iter().filter(|s| s.axis == axis).collect();
        if members.is_empty() {
            return None;
        }
        let (mut low, mut high) = members
            .iter()
            .flat_map(|item| item.series.values.iter().copied())
            .filter(|value| value.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), value| {
                (low.min(value), high.max(value))
            });
        if members.iter().any(|item| item.is_bars()) {
            low = low.min(0.0);
            high = high.max(0.0);
        }
        if low > high {
            return Some(0.0..1.0);
        }
        let pad = if high > low { (high - low) * 0.05 } else { 1.0 };
        Some(low - pad..high + pad)
    }

    /// `name [unit]` of the first series on an axis.
    pub fn axis_label(&self, axis: AxisGroup) -> Option<String> {
        self.series
            .iter()
            .find(|s| s.axis == axis)
            .map(|s| format!("{} [{}]", s.series.name, s.series.unit))
    }

    /// `Time (Starting time= ...)` with the window start in host local time.
    pub fn x_caption(&self) -> String {
        self.x_caption_in(&Local)
    }

    fn x_caption_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: Display,
    {
        let start = self
            .window
            .start_utc()
            .map(|start| {
                start
                    .with_timezone(tz)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_default();
        format!("Time (Starting time= {start})")
    }
}

fn bar_extent(day: f64) -> (f64, f64) {
    let centre = day - BAR_SHIFT_DAYS;
    (centre - BAR_WIDTH_DAYS / 2.0, centre + BAR_WIDTH_DAYS / 2.0)
}

fn line_points(series: &PlotSeries, x_range: &Range<f64>) -> Vec<(f64, f64)> {
    series
        .plot_points()
        .filter(|(day, value)| value.is_finite() && x_range.contains(day))
        .collect()
}

fn line_style(color: RGBAColor) -> ShapeStyle {
    color.stroke_width(LINE_WIDTH_PX)
}

fn bar_elements(
    series: &PlotSeries,
    x_range: &Range<f64>,
    color: RGBAColor,
) -> Vec<Rectangle<(f64, f64)>> {
    series
        .plot_points()
        .filter(|(_, value)| value.is_finite())
        .filter_map(|(day, value)| {
            let (left, right) = bar_extent(day);
            let (left, right) = (left.max(x_range.start), right.min(x_range.end));
            (left < right).then(|| Rectangle::new([(left, 0.0), (right, value)], color.filled()))
        })
        .collect()
}

/// Draws the chart onto `root`.
pub fn draw_chart<DB: DrawingBackend>(
    spec: &ChartSpec,
    root: &DrawingArea<DB, Shift>,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let scale = f64::from(spec.dpi) / 100.0;
    let font = |size: f64| ("sans-serif", size * scale).into_font();
    let label_area = (32.0 * scale) as u32;

    let x_range = spec.x_range();
    let primary_y = spec.y_range(AxisGroup::Primary).unwrap_or(0.0..1.0);
    let secondary_y = spec.y_range(AxisGroup::Secondary);
    let plan = TickPlan::for_duration(spec.window.duration_hours());
    let labelled = plan.major.points(&x_range);
    debug!(
        "Chart x range {:?}, primary y {:?}, secondary y {:?}, ticks {:?} ({} labelled)",
        x_range,
        primary_y,
        secondary_y,
        plan,
        labelled.len()
    );
    let label_count = labelled.len().max(2);
    let x_axis = x_range
        .clone()
        .with_key_points(labelled)
        .with_light_points(plan.minor.points(&x_range));
    let right_label_area = if secondary_y.is_some() {
        label_area + (8.0 * scale) as u32
    } else {
        0
    };

    let mut chart = ChartBuilder::on(root)
        .margin((4.0 * scale) as u32)
        .x_label_area_size(label_area)
        .y_label_area_size(label_area + (8.0 * scale) as u32)
        .right_y_label_area_size(right_label_area)
        .build_cartesian_2d(x_axis, primary_y)?
        .set_secondary_coord(x_range.clone(), secondary_y.clone().unwrap_or(0.0..1.0));

    chart
        .configure_mesh()
        .x_labels(label_count)
        .x_label_formatter(&|x| day_label(*x))
        .x_desc(spec.x_caption())
        .y_desc(spec.axis_label(AxisGroup::Primary).unwrap_or_default())
        .label_style(font(7.0))
        .axis_desc_style(font(8.0))
        .draw()?;

    if let Some(label) = spec.axis_label(AxisGroup::Secondary) {
        chart
            .configure_secondary_axes()
            .y_desc(label)
            .label_style(font(7.0))
            .draw()?;
    }

    for (index, item) in spec.series.iter().enumerate() {
        let color = Palette99::pick(index).to_rgba();
        let anno = match (item.axis, item.is_bars()) {
            (AxisGroup::Primary, true) => {
                chart.draw_series(bar_elements(&item.series, &x_range, color))?
            }
            (AxisGroup::Secondary, true) => {
                chart.draw_secondary_series(bar_elements(&item.series, &x_range, color))?
            }
            (AxisGroup::Primary, false) => chart.draw_series(LineSeries::new(
                line_points(&item.series, &x_range),
                line_style(color),
            ))?,
            (AxisGroup::Secondary, false) => chart.draw_secondary_series(LineSeries::new(
                line_points(&item.series, &x_range),
                line_style(color),
            ))?,
        };

        let label = item.series.name.clone();
        if item.is_bars() {
            anno.label(label).legend(move |(x, y)| {
                Rectangle::new([(x, y - 4), (x + 12, y + 4)], color.filled())
            });
        } else {
            anno.label(label).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 15, y)], line_style(color))
            });
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(font(7.0))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn paint<DB: DrawingBackend>(
    spec: &ChartSpec,
    root: &DrawingArea<DB, Shift>,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;
    draw_chart(spec, root)?;
    root.present()?;
    Ok(())
}

/// Renders `spec` to `path`, choosing SVG or bitmap output from the extension.
pub fn render_chart(spec: &ChartSpec, path: &Path) -> Result<(), ChartError> {
    let draw_error = |message: String| ChartError::Draw {
        path: path.to_path_buf(),
        message,
    };
    let format = ChartFormat::from_path(path);
    match format {
        ChartFormat::Svg => {
            let root = SVGBackend::new(path, spec.pixel_size()).into_drawing_area();
            paint(spec, &root).map_err(|e| draw_error(e.to_string()))?;
        }
        ChartFormat::Bitmap => {
            let root = BitMapBackend::new(path, spec.pixel_size()).into_drawing_area();
            paint(spec, &root).map_err(|e| draw_error(e.to_string()))?;
        }
    }
    info!(
        "Wrote {:?} chart of {} series to {:?}",
        format,
        spec.series.len(),
        path
    );
    Ok(())
}
