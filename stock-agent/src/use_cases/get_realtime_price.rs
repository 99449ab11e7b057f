use std::sync::Arc;

use stock_core::{AgentError, StockPrice};
use stock_data_services::StockDataProvider;

use super::normalize_symbol;

/// Use-case: fetch the current real-time quote for a ticker symbol.
pub struct GetRealtimePriceUseCase {
    provider: Arc<dyn StockDataProvider>,
}

impl GetRealtimePriceUseCase {
    pub fn new(provider: Arc<dyn StockDataProvider>) -> Self {
        Self { provider }
    }

    /// Symbol is trimmed and uppercased before it reaches the backend;
    /// blank input fails with `InvalidArgument`.
    pub async fn execute(&self, symbol: &str) -> Result<StockPrice, AgentError> {
        let symbol = normalize_symbol(symbol)?;
        self.provider.quote(&symbol).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use stock_core::HistoricalRecord;
    use stock_data_services::HistoryRange;

    struct RecordingProvider {
        seen_symbol: Mutex<Option<String>>,
    }

    #[async_trait]
    impl StockDataProvider for RecordingProvider {
        async fn quote(&self, symbol: &str) -> Result<StockPrice, AgentError> {
            *self.seen_symbol.lock().unwrap() = Some(symbol.to_string());
            Ok(StockPrice {
                symbol: symbol.to_string(),
                current_price: Some(224.3),
                previous_close: Some(221.1),
                open: Some(222.0),
                day_high: Some(225.0),
                day_low: Some(220.9),
                volume: Some(31_000_000),
                currency: "USD".to_string(),
                market_state: "REGULAR".to_string(),
            })
        }

        async fn history(
            &self,
            _symbol: &str,
            _range: &HistoryRange,
            _interval: &str,
        ) -> Result<Vec<HistoricalRecord>, AgentError> {
            unreachable!("quote use case never fetches history")
        }
    }

    #[tokio::test]
    async fn test_symbol_is_trimmed_and_uppercased() {
        let provider = Arc::new(RecordingProvider {
            seen_symbol: Mutex::new(None),
        });
        let use_case = GetRealtimePriceUseCase::new(provider.clone());

        let price = use_case.execute("  amzn \n").await.unwrap();
        assert_eq!(price.symbol, "AMZN");
        assert_eq!(provider.seen_symbol.lock().unwrap().as_deref(), Some("AMZN"));
    }

    #[tokio::test]
    async fn test_blank_symbol_is_invalid() {
        let provider = Arc::new(RecordingProvider {
            seen_symbol: Mutex::new(None),
        });
        let use_case = GetRealtimePriceUseCase::new(provider.clone());

        let err = use_case.execute("   ").await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidArgument(_)));
        assert!(provider.seen_symbol.lock().unwrap().is_none());
    }
}
