use serde::{Deserialize, Serialize};

/// Point-in-time quote snapshot. Constructed fresh for every query; the
/// use-case layer never caches these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPrice {
    pub symbol: String,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub open: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub volume: Option<u64>,
    pub currency: String,
    pub market_state: String,
}

/// One observed OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    /// ISO-8601 date (YYYY-MM-DD)
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Historical OHLCV series, records ordered chronologically ascending.
///
/// `period` is either the relative-period token the caller supplied
/// (e.g. "3mo") or a literal "<start> to <end>" range when explicit dates
/// were used; the distinction round-trips to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPrices {
    pub symbol: String,
    pub period: String,
    pub interval: String,
    pub records: Vec<HistoricalRecord>,
}
