use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use stock_core::{AgentError, HistoricalPrices};
use stock_data_services::{HistoryRange, StockDataProvider};

use super::normalize_symbol;

/// Use-case: fetch historical OHLCV prices for a ticker symbol.
///
/// When `start_date` is supplied it takes precedence over `period`
/// entirely; `end_date` then defaults to today. The returned `period`
/// label round-trips the caller's choice: the original period token, or
/// a literal "<start> to <end>" range.
pub struct GetHistoricalPricesUseCase {
    provider: Arc<dyn StockDataProvider>,
}

impl GetHistoricalPricesUseCase {
    pub fn new(provider: Arc<dyn StockDataProvider>) -> Self {
        Self { provider }
    }

    pub async fn execute(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<HistoricalPrices, AgentError> {
        let symbol = normalize_symbol(symbol)?;

        let (range, period_label) = match start_date {
            Some(start_str) => {
                let start = parse_iso_date(start_str)?;
                let end = match end_date {
                    Some(end_str) => parse_iso_date(end_str)?,
                    None => Utc::now().date_naive(),
                };
                let label = format!("{} to {}", start_str, end_date.unwrap_or("today"));
                (HistoryRange::Dates { start, end }, label)
            }
            None => (
                HistoryRange::Period(period.to_string()),
                period.to_string(),
            ),
        };

        // DataUnavailable from the backend propagates unmodified
        let records = self.provider.history(&symbol, &range, interval).await?;

        Ok(HistoricalPrices {
            symbol,
            period: period_label,
            interval: interval.to_string(),
            records,
        })
    }
}

fn parse_iso_date(s: &str) -> Result<NaiveDate, AgentError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AgentError::InvalidArgument(format!("malformed date: {:?}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use stock_core::{HistoricalRecord, StockPrice};

    struct RecordingProvider {
        seen: Mutex<Vec<(String, HistoryRange, String)>>,
        response: Vec<HistoricalRecord>,
    }

    impl RecordingProvider {
        fn new(response: Vec<HistoricalRecord>) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                response,
            })
        }
    }

    #[async_trait]
    impl StockDataProvider for RecordingProvider {
        async fn quote(&self, _symbol: &str) -> Result<StockPrice, AgentError> {
            unreachable!("history use case never fetches quotes")
        }

        async fn history(
            &self,
            symbol: &str,
            range: &HistoryRange,
            interval: &str,
        ) -> Result<Vec<HistoricalRecord>, AgentError> {
            self.seen.lock().unwrap().push((
                symbol.to_string(),
                range.clone(),
                interval.to_string(),
            ));
            if self.response.is_empty() {
                return Err(AgentError::DataUnavailable(format!(
                    "no historical data for symbol: {}",
                    symbol
                )));
            }
            Ok(self.response.clone())
        }
    }

    fn bar(date: &str) -> HistoricalRecord {
        HistoricalRecord {
            date: date.to_string(),
            open: 220.0,
            high: 225.5,
            low: 219.1,
            close: 224.3,
            volume: 31_000_000,
        }
    }

    #[tokio::test]
    async fn test_period_token_round_trips() {
        let provider = RecordingProvider::new(vec![bar("2025-01-02")]);
        let use_case = GetHistoricalPricesUseCase::new(provider.clone());

        let prices = use_case
            .execute("amzn", "3mo", "1d", None, None)
            .await
            .unwrap();
        assert_eq!(prices.period, "3mo");
        assert_eq!(prices.symbol, "AMZN");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].1, HistoryRange::Period("3mo".to_string()));
    }

    #[tokio::test]
    async fn test_start_date_overrides_period_entirely() {
        let provider = RecordingProvider::new(vec![bar("2025-01-02")]);
        let use_case = GetHistoricalPricesUseCase::new(provider.clone());

        // Two calls differing only in period must hit the backend with the
        // same date range
        use_case
            .execute("AMZN", "3mo", "1d", Some("2025-01-01"), Some("2025-02-01"))
            .await
            .unwrap();
        use_case
            .execute("AMZN", "5y", "1d", Some("2025-01-01"), Some("2025-02-01"))
            .await
            .unwrap();

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].1, seen[1].1);
        assert!(matches!(seen[0].1, HistoryRange::Dates { .. }));
    }

    #[tokio::test]
    async fn test_date_range_label_round_trips() {
        let provider = RecordingProvider::new(vec![bar("2025-01-02")]);
        let use_case = GetHistoricalPricesUseCase::new(provider.clone());

        let explicit = use_case
            .execute("AMZN", "3mo", "1d", Some("2025-01-01"), Some("2025-02-01"))
            .await
            .unwrap();
        assert_eq!(explicit.period, "2025-01-01 to 2025-02-01");

        let open_ended = use_case
            .execute("AMZN", "3mo", "1d", Some("2025-01-01"), None)
            .await
            .unwrap();
        assert_eq!(open_ended.period, "2025-01-01 to today");
    }

    #[tokio::test]
    async fn test_records_are_chronologically_ascending() {
        let provider =
            RecordingProvider::new(vec![bar("2025-01-02"), bar("2025-01-03"), bar("2025-01-06")]);
        let use_case = GetHistoricalPricesUseCase::new(provider);

        let prices = use_case
            .execute("AMZN", "1mo", "1d", None, None)
            .await
            .unwrap();
        let dates: Vec<&str> = prices.records.iter().map(|r| r.date.as_str()).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }

    #[tokio::test]
    async fn test_data_unavailable_propagates_unmodified() {
        let provider = RecordingProvider::new(Vec::new());
        let use_case = GetHistoricalPricesUseCase::new(provider);

        let err = use_case
            .execute("ZZZZ", "3mo", "1d", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_malformed_start_date_is_invalid() {
        let provider = RecordingProvider::new(vec![bar("2025-01-02")]);
        let use_case = GetHistoricalPricesUseCase::new(provider.clone());

        let err = use_case
            .execute("AMZN", "3mo", "1d", Some("01/02/2025"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidArgument(_)));
        assert!(provider.seen.lock().unwrap().is_empty());
    }
}
