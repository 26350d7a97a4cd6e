pub mod ma;
pub mod returns;
pub mod volatility;

use error_stack::Report;
use tracing::{debug, trace};

use crate::error::IndicatorError;
use crate::model::{DailyBar, DerivedColumns, TimeSeriesTable};

use ma::Sma;
use returns::DailyReturn;
use volatility::RollingVolatility;

pub const SMA_SHORT_PERIOD: usize = 20;
pub const SMA_LONG_PERIOD: usize = 50;
pub const VOLATILITY_WINDOW: usize = 20;
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// A technical analysis indicator that operates on a slice of daily bars.
///
/// Bars must be in ascending date order (oldest first).
pub trait Indicator {
    /// Unique name of this indicator (e.g., "sma").
    fn name(&self) -> &str;

    /// Minimum number of bars required to produce at least one output value.
    fn required_rows(&self) -> usize;

    /// Calculate indicator values from bars.
    ///
    /// Returns one value per output point, aligned to the end of the input.
    /// The output is shorter than the input by the indicator's lookback.
    fn calculate(&self, bars: &[DailyBar]) -> Result<Vec<f64>, Report<IndicatorError>>;
}

/// Extract close prices from a slice of bars.
pub fn close_prices(bars: &[DailyBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Left-pad a lookback-trimmed output with undefined entries so it lines up
/// with the `total_len` input rows.
pub fn align_series(total_len: usize, values: Vec<f64>) -> Vec<Option<f64>> {
    let offset = total_len.saturating_sub(values.len());
    let mut output = vec![None; total_len];
    for (index, value) in values.into_iter().enumerate() {
        output[offset + index] = Some(value);
    }
    output
}

/// Full-length series for `indicator`. A table shorter than the indicator's
/// lookback yields an all-undefined series rather than an error.
pub fn series(
    indicator: &dyn Indicator,
    bars: &[DailyBar],
) -> Result<Vec<Option<f64>>, Report<IndicatorError>> {
    if bars.len() < indicator.required_rows() {
        trace!(
            indicator = indicator.name(),
            required = indicator.required_rows(),
            available = bars.len(),
            "lookback not reached; series undefined"
        );
        return Ok(vec![None; bars.len()]);
    }
    Ok(align_series(bars.len(), indicator.calculate(bars)?))
}

/// Fill the table's derived columns: 20/50-day SMA of close, daily return,
/// and annualized 20-day rolling volatility of the daily return.
pub fn calculate_indicators(table: &mut TimeSeriesTable) -> Result<(), Report<IndicatorError>> {
    let bars = table.rows();

    let sma_short = Sma::new(SMA_SHORT_PERIOD)?;
    let sma_long = Sma::new(SMA_LONG_PERIOD)?;
    let volatility = RollingVolatility::new(VOLATILITY_WINDOW, TRADING_DAYS_PER_YEAR)?;

    let sma20 = series(&sma_short, bars)?;
    let sma50 = series(&sma_long, bars)?;
    let daily_return = series(&DailyReturn, bars)?;
    let volatility = volatility.series(&daily_return);

    debug!(
        rows = bars.len(),
        sma20_defined = defined_count(&sma20),
        sma50_defined = defined_count(&sma50),
        volatility_defined = defined_count(&volatility),
        "indicators calculated"
    );

    table.set_derived(DerivedColumns {
        sma20,
        sma50,
        daily_return,
        volatility,
    });
    Ok(())
}

fn defined_count(values: &[Option<f64>]) -> usize {
    values.iter().filter(|v| v.is_some()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::bars_from_closes;

    fn ramp_table(n: usize) -> TimeSeriesTable {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        TimeSeriesTable::new(bars_from_closes(&closes, 10.0))
    }

    #[test]
    fn align_series_pads_front() {
        let aligned = align_series(4, vec![1.0, 2.0]);
        assert_eq!(aligned, vec![None, None, Some(1.0), Some(2.0)]);
    }

    #[test]
    fn twenty_five_rows_scenario() {
        let mut table = ramp_table(25);
        calculate_indicators(&mut table).unwrap();

        assert_eq!(table.sma50().len(), 25);
        assert!(table.sma50().iter().all(Option::is_none));

        for (i, value) in table.sma20().iter().enumerate() {
            if i < 19 {
                assert!(value.is_none(), "sma20[{i}] should be undefined");
            } else {
                // mean of 100+i-19 ..= 100+i
                let expected = 100.0 + i as f64 - 9.5;
                assert!((value.unwrap() - expected).abs() < 1e-9);
            }
        }

        assert!(table.daily_returns()[0].is_none());
        assert!(table.daily_returns()[1..].iter().all(|r| r.unwrap() > 0.0));
    }

    #[test]
    fn volatility_defined_from_row_twenty() {
        let mut table = ramp_table(30);
        calculate_indicators(&mut table).unwrap();
        let vol = table.volatility();
        assert!(vol[..20].iter().all(Option::is_none));
        assert!(vol[20..].iter().all(Option::is_some));
    }

    #[test]
    fn sma50_defined_from_row_forty_nine() {
        let mut table = ramp_table(60);
        calculate_indicators(&mut table).unwrap();
        let sma50 = table.sma50();
        assert!(sma50[48].is_none());
        // mean of 100..=149
        assert!((sma50[49].unwrap() - 124.5).abs() < 1e-9);
        assert!((sma50[59].unwrap() - 134.5).abs() < 1e-9);
    }

    #[test]
    fn empty_table_gets_empty_columns() {
        let mut table = TimeSeriesTable::new(Vec::new());
        calculate_indicators(&mut table).unwrap();
        assert!(table.sma20().is_empty());
        assert!(table.sma50().is_empty());
        assert!(table.daily_returns().is_empty());
        assert!(table.volatility().is_empty());
    }

    #[test]
    fn recalculation_is_deterministic() {
        let mut first = ramp_table(40);
        let mut second = ramp_table(40);
        calculate_indicators(&mut first).unwrap();
        calculate_indicators(&mut second).unwrap();
        calculate_indicators(&mut second).unwrap();
        assert_eq!(first.volatility(), second.volatility());
        assert_eq!(first.sma20(), second.sma20());
    }
}
