pub mod price;
pub mod volatility;
pub mod volume;

use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use error_stack::Report;
use plotters::style::{FontStyle, RGBAColor, register_font};
use tracing::info;

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::model::TimeSeriesTable;

use price::PriceChart;
use volatility::VolatilityChart;
use volume::VolumeChart;

/// A static chart written to a single image file.
pub trait Chart {
    /// File name of the image, relative to the output directory.
    fn file_name(&self) -> &'static str;

    /// Short human-readable description used in the text report.
    fn description(&self) -> &'static str;

    /// Draw the chart for `table` into `path`, overwriting any existing file.
    fn render(
        &self,
        table: &TimeSeriesTable,
        config: &RenderConfig,
        path: &Path,
    ) -> Result<(), Report<RenderError>>;
}

/// The price, volume and volatility charts, in report order.
pub fn default_charts() -> Vec<Box<dyn Chart>> {
    vec![
        Box::new(PriceChart),
        Box::new(VolumeChart),
        Box::new(VolatilityChart),
    ]
}

const FONT_FAMILY: &str = "sans-serif";
static FONT_DATA: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

/// Register the bundled font as the `sans-serif` family, so text rendering
/// does not depend on fonts installed on the host.
pub fn register_fonts() -> Result<(), Report<RenderError>> {
    register_font(FONT_FAMILY, FontStyle::Normal, FONT_DATA).map_err(|_| {
        Report::new(RenderError::Font {
            family: FONT_FAMILY.to_string(),
        })
    })
}

/// Render every chart into `dir`. Stops at the first failure.
pub fn render_all(
    charts: &[Box<dyn Chart>],
    table: &TimeSeriesTable,
    config: &RenderConfig,
    dir: &Path,
) -> Result<Vec<PathBuf>, Report<RenderError>> {
    register_fonts()?;

    let mut written = Vec::with_capacity(charts.len());
    for chart in charts {
        let path = dir.join(chart.file_name());
        chart.render(table, config, &path)?;
        info!(path = %path.display(), "chart written");
        written.push(path);
    }
    Ok(written)
}

/// An opaque `#RRGGBB` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn parse_hex(raw: &str) -> Option<Self> {
        let hex = raw.strip_prefix('#')?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn with_alpha(self, alpha: f64) -> RGBAColor {
        RGBAColor(self.0, self.1, self.2, alpha)
    }
}

/// Resolve a configured color, reporting which setting was bad.
pub(crate) fn color_setting(raw: &str, field: &str) -> Result<Rgb, Report<RenderError>> {
    Rgb::parse_hex(raw).ok_or_else(|| {
        Report::new(RenderError::Config {
            field: format!("{field} \"{raw}\" is not #RRGGBB"),
        })
    })
}

pub(crate) fn draw_failed(chart: &str, err: impl fmt::Display) -> Report<RenderError> {
    Report::new(RenderError::Backend {
        chart: chart.to_string(),
    })
    .attach(err.to_string())
}

/// Placeholder axis for a table with no rows.
fn placeholder_dates() -> Range<NaiveDate> {
    // NaiveDate's default is 1970-01-01
    let start = NaiveDate::default();
    start..next_day(start)
}

pub(crate) fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

/// X axis from the first date through the day after the last, so the last
/// bar has width and a single-row table still has a non-empty range.
pub(crate) fn date_axis(table: &TimeSeriesTable) -> Range<NaiveDate> {
    match table.date_range() {
        Some((first, last)) => first..next_day(last),
        None => placeholder_dates(),
    }
}

/// Y axis covering `values` with 5% padding on both sides. Degenerate or
/// empty inputs are widened so the range is never empty.
pub(crate) fn value_axis(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        return 0.0..1.0;
    }
    let span = max - min;
    if span == 0.0 {
        let pad = (min.abs() * 0.05).max(1.0);
        return (min - pad)..(max + pad);
    }
    let pad = span * 0.05;
    (min - pad)..(max + pad)
}

/// Split a column into runs of consecutive defined points. Undefined entries
/// break the line rather than being filled in.
pub(crate) fn segments(
    dates: &[NaiveDate],
    values: &[Option<f64>],
) -> Vec<Vec<(NaiveDate, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (&date, value) in dates.iter().zip(values) {
        match value {
            Some(v) if v.is_finite() => current.push((date, *v)),
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

pub(crate) fn title(config: &RenderConfig, subject: &str) -> String {
    format!("{} {subject}", config.asset_name)
}
