use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, close_prices};
use crate::model::DailyBar;

/// Simple Moving Average of the close price.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    /// Calculate SMA values from a price slice.
    ///
    /// Uses a running sum, so each step adds the newest price and drops the
    /// one leaving the window.
    pub fn calculate_prices(&self, prices: &[f64]) -> Result<Vec<f64>, Report<IndicatorError>> {
        if prices.len() < self.period {
            bail!(IndicatorError::InsufficientData {
                required: self.period,
                available: prices.len(),
            });
        }

        let period = self.period as f64;
        let mut sum: f64 = prices[..self.period].iter().sum();
        let mut results = Vec::with_capacity(prices.len() - self.period + 1);
        results.push(sum / period);

        for i in self.period..prices.len() {
            sum += prices[i] - prices[i - self.period];
            results.push(sum / period);
        }

        Ok(results)
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        "sma"
    }

    fn required_rows(&self) -> usize {
        self.period
    }

    fn calculate(&self, bars: &[DailyBar]) -> Result<Vec<f64>, Report<IndicatorError>> {
        self.calculate_prices(&close_prices(bars))
    }
}
