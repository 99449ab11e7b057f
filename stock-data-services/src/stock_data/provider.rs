use async_trait::async_trait;
use chrono::NaiveDate;
use stock_core::{AgentError, HistoricalRecord, StockPrice};

/// Time window for a historical price query: either a relative period token
/// understood by the backend ("3mo", "1y", ...) or an explicit date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryRange {
    Period(String),
    Dates { start: NaiveDate, end: NaiveDate },
}

/// Market data backend port. Implementations fetch raw quote fields and
/// ordered raw bars; assembling domain results (period labels, validation)
/// stays in the use-case layer.
///
/// Implementations must be safe for concurrent readers and must fail with
/// `DataUnavailable` when the backend has no data for the request.
#[async_trait]
pub trait StockDataProvider: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<StockPrice, AgentError>;

    /// Bars ordered chronologically ascending, one per observed interval.
    async fn history(
        &self,
        symbol: &str,
        range: &HistoryRange,
        interval: &str,
    ) -> Result<Vec<HistoricalRecord>, AgentError>;
}
