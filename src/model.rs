use chrono::NaiveDate;

/// One day of OHLCV data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl DailyBar {
    /// Whether the bar is internally coherent: positive prices, a high at or
    /// above the low with open and close between them, and no negative volume.
    pub fn is_consistent(&self) -> bool {
        self.low > 0.0
            && self.high >= self.low
            && (self.low..=self.high).contains(&self.open)
            && (self.low..=self.high).contains(&self.close)
            && self.volume >= 0.0
    }
}

/// Indicator columns derived from the raw bars.
///
/// Each column is either empty (not computed yet) or holds exactly one entry
/// per row, with `None` marking rows where the trailing window is not full.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedColumns {
    pub sma20: Vec<Option<f64>>,
    pub sma50: Vec<Option<f64>>,
    pub daily_return: Vec<Option<f64>>,
    pub volatility: Vec<Option<f64>>,
}

/// Daily bars ordered by ascending date, plus their derived indicator columns.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesTable {
    rows: Vec<DailyBar>,
    derived: DerivedColumns,
}

impl TimeSeriesTable {
    /// Build a table from bars in any order. The sort is stable, so rows that
    /// share a date keep their input order.
    pub fn new(mut rows: Vec<DailyBar>) -> Self {
        rows.sort_by_key(|bar| bar.date);
        Self {
            rows,
            derived: DerivedColumns::default(),
        }
    }

    /// Build a table from bars already in ascending date order, as the loader
    /// produces them.
    pub(crate) fn from_sorted(rows: Vec<DailyBar>) -> Self {
        debug_assert!(
            rows.windows(2).all(|pair| pair[0].date <= pair[1].date),
            "rows must be sorted by date"
        );
        Self {
            rows,
            derived: DerivedColumns::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[DailyBar] {
        &self.rows
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|bar| bar.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|bar| bar.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.rows.iter().map(|bar| bar.volume).collect()
    }

    pub fn sma20(&self) -> &[Option<f64>] {
        &self.derived.sma20
    }

    pub fn sma50(&self) -> &[Option<f64>] {
        &self.derived.sma50
    }

    pub fn daily_returns(&self) -> &[Option<f64>] {
        &self.derived.daily_return
    }

    pub fn volatility(&self) -> &[Option<f64>] {
        &self.derived.volatility
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|bar| bar.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|bar| bar.date)
    }

    /// First and last date, or `None` for an empty table.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.first_date()?, self.last_date()?))
    }

    /// Replace the derived columns. Only the indicator calculator calls this.
    pub(crate) fn set_derived(&mut self, derived: DerivedColumns) {
        let len = self.rows.len();
        debug_assert!(
            [
                &derived.sma20,
                &derived.sma50,
                &derived.daily_return,
                &derived.volatility,
            ]
            .iter()
            .all(|column| column.len() == len),
            "derived columns must have one entry per row"
        );
        self.derived = derived;
    }
}
