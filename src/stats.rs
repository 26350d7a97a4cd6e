use std::fmt;

use crate::model::TimeSeriesTable;

/// Aggregate statistics over a whole table.
///
/// Price, return and volatility figures ignore undefined entries: only the
/// defined values of a column enter the mean, median and standard deviation.
/// A figure with nothing to aggregate is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsSummary {
    pub mean_price: Option<f64>,
    pub median_price: Option<f64>,
    pub std_dev_price: Option<f64>,
    /// Mean daily return, in percent.
    pub mean_daily_return: Option<f64>,
    pub mean_volatility: Option<f64>,
    pub total_volume: f64,
}

impl StatisticsSummary {
    /// `(label, value)` pairs in display order.
    pub fn entries(&self) -> [(&'static str, Option<f64>); 6] {
        [
            ("Mean Price", self.mean_price),
            ("Median Price", self.median_price),
            ("Std Dev Price", self.std_dev_price),
            ("Mean Daily Return", self.mean_daily_return),
            ("Mean Volatility", self.mean_volatility),
            ("Total Volume", Some(self.total_volume)),
        ]
    }
}

/// Two-decimal rendering of a statistic; undefined prints as `n/a`.
pub struct StatValue(pub Option<f64>);

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value:.2}"),
            None => write!(f, "n/a"),
        }
    }
}

pub fn compute_statistics(table: &TimeSeriesTable) -> StatisticsSummary {
    let closes = table.closes();
    let returns = defined(table.daily_returns());
    let volatility = defined(table.volatility());

    StatisticsSummary {
        mean_price: mean(&closes),
        median_price: median(&closes),
        std_dev_price: sample_std(&closes),
        mean_daily_return: mean(&returns).map(|r| r * 100.0),
        mean_volatility: mean(&volatility),
        total_volume: table.volumes().iter().sum(),
    }
}

fn defined(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n - 1 denominator). Needs at least two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance =
        values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}
