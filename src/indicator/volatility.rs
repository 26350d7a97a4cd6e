use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::stats::sample_std;

/// Rolling sample standard deviation of a return series, annualized by
/// `sqrt(periods_per_year)`.
pub struct RollingVolatility {
    window: usize,
    annualization: f64,
}

impl RollingVolatility {
    pub fn new(window: usize, periods_per_year: usize) -> Result<Self, Report<IndicatorError>> {
        if window < 2 {
            bail!(IndicatorError::InvalidParameter {
                name: "window must be >= 2".into(),
            });
        }
        if periods_per_year == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "periods_per_year must be > 0".into(),
            });
        }
        Ok(Self {
            window,
            annualization: (periods_per_year as f64).sqrt(),
        })
    }

    /// Full-length volatility series. A row is defined only when every return
    /// in its trailing window is defined.
    pub fn series(&self, returns: &[Option<f64>]) -> Vec<Option<f64>> {
        (0..returns.len())
            .map(|i| {
                let start = (i + 1).checked_sub(self.window)?;
                let window = returns[start..=i]
                    .iter()
                    .copied()
                    .collect::<Option<Vec<f64>>>()?;
                sample_std(&window).map(|std| std * self.annualization)
            })
            .collect()
    }
}
