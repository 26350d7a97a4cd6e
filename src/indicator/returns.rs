use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, close_prices};
use crate::model::DailyBar;

/// Fractional change of the close from the previous row.
pub struct DailyReturn;

impl DailyReturn {
    pub fn calculate_prices(&self, prices: &[f64]) -> Result<Vec<f64>, Report<IndicatorError>> {
        if prices.len() < 2 {
            bail!(IndicatorError::InsufficientData {
                required: 2,
                available: prices.len(),
            });
        }
        Ok(prices.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect())
    }
}

impl Indicator for DailyReturn {
    fn name(&self) -> &str {
        "daily_return"
    }

    fn required_rows(&self) -> usize {
        2
    }

    fn calculate(&self, bars: &[DailyBar]) -> Result<Vec<f64>, Report<IndicatorError>> {
        self.calculate_prices(&close_prices(bars))
    }
}
