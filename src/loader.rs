use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use error_stack::{Report, ResultExt};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::LoadError;
use crate::model::{DailyBar, TimeSeriesTable};

/// What to do with input rows that share a calendar date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the row that appears last in the file.
    #[default]
    KeepLast,
    /// Keep the row that appears first in the file.
    KeepFirst,
    /// Fail the load.
    Reject,
    /// Pass every row through in file order.
    KeepAll,
}

const REQUIRED_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Positions of the required columns within the header row.
struct ColumnIndex([usize; 6]);

impl ColumnIndex {
    fn locate(headers: &StringRecord) -> Result<Self, Report<LoadError>> {
        let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let mut positions = [0; 6];
        for (slot, column) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = lowered
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| {
                    Report::new(LoadError::MissingColumn {
                        column: column.to_string(),
                    })
                })?;
        }
        Ok(Self(positions))
    }

    fn parse(&self, record: &StringRecord, row: usize) -> Result<DailyBar, Report<LoadError>> {
        let [date, open, high, low, close, volume] = self.0;
        let field = |index: usize| record.get(index).unwrap_or("");
        let number = |index: usize, column: &str| parse_number(field(index), row, column);

        let raw_date = field(date);
        let date = parse_date(raw_date).ok_or_else(|| {
            Report::new(LoadError::InvalidDate {
                row,
                value: raw_date.to_string(),
            })
        })?;

        Ok(DailyBar {
            date,
            open: number(open, "open")?,
            high: number(high, "high")?,
            low: number(low, "low")?,
            close: number(close, "close")?,
            volume: number(volume, "volume")?,
        })
    }
}

/// Parse a calendar date. A time-of-day component, if present, is discarded.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn parse_number(raw: &str, row: usize, column: &str) -> Result<f64, Report<LoadError>> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(Report::new(LoadError::InvalidNumber {
            row,
            column: column.to_string(),
            value: raw.to_string(),
        })),
    }
}

/// Load a daily OHLCV CSV file into a table sorted by ascending date.
///
/// Header names are matched case-insensitively and extra columns are ignored.
pub fn load_table(
    path: &Path,
    policy: DuplicatePolicy,
) -> Result<TimeSeriesTable, Report<LoadError>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .change_context(LoadError::Open)
        .attach_with(|| format!("path: {}", path.display()))?;

    let headers = reader
        .headers()
        .change_context(LoadError::Read)
        .attach_with(|| format!("path: {}", path.display()))?
        .clone();
    let columns = ColumnIndex::locate(&headers)
        .attach_with(|| format!("path: {}", path.display()))?;

    let mut bars = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        let record = result
            .change_context(LoadError::Read)
            .attach_with(|| format!("row: {row}"))?;
        bars.push(columns.parse(&record, row)?);
    }

    let total = bars.len();
    bars.sort_by_key(|bar| bar.date);
    let bars = resolve_duplicates(bars, policy)?;

    let dropped = total - bars.len();
    if dropped > 0 {
        warn!(
            path = %path.display(),
            dropped,
            policy = ?policy,
            "dropped rows with duplicate dates"
        );
    }

    let inconsistent = bars.iter().filter(|bar| !bar.is_consistent()).count();
    if inconsistent > 0 {
        warn!(
            path = %path.display(),
            inconsistent,
            "rows with incoherent OHLCV values kept as-is"
        );
    }

    info!(path = %path.display(), rows = bars.len(), "input loaded");
    Ok(TimeSeriesTable::from_sorted(bars))
}

/// Apply `policy` to date-sorted bars. The input sort must be stable so that
/// rows sharing a date are still in file order.
fn resolve_duplicates(
    mut bars: Vec<DailyBar>,
    policy: DuplicatePolicy,
) -> Result<Vec<DailyBar>, Report<LoadError>> {
    match policy {
        DuplicatePolicy::KeepAll => {}
        DuplicatePolicy::KeepFirst => bars.dedup_by_key(|bar| bar.date),
        DuplicatePolicy::KeepLast => {
            bars.reverse();
            bars.dedup_by_key(|bar| bar.date);
            bars.reverse();
        }
        DuplicatePolicy::Reject => {
            if let Some(pair) = bars.windows(2).find(|pair| pair[0].date == pair[1].date) {
                return Err(Report::new(LoadError::DuplicateDate {
                    date: pair[0].date.format("%Y-%m-%d").to_string(),
                }));
            }
        }
    }
    Ok(bars)
}
