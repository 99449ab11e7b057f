use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{error_payload, AgentTool};
use crate::use_cases::{GetHistoricalPricesUseCase, GetRealtimePriceUseCase};

/// Tool wrapper around the real-time quote use case.
pub struct RealtimePriceTool {
    use_case: GetRealtimePriceUseCase,
}

impl RealtimePriceTool {
    pub fn new(use_case: GetRealtimePriceUseCase) -> Self {
        Self { use_case }
    }
}

#[derive(Deserialize)]
struct RealtimeArgs {
    symbol: String,
}

#[async_trait]
impl AgentTool for RealtimePriceTool {
    fn name(&self) -> &'static str {
        "retrieve_realtime_stock_price"
    }

    fn description(&self) -> &'static str {
        "Retrieve the current real-time stock price and key market metrics \
         for a given ticker symbol (e.g. 'AMZN', 'AAPL', 'GOOGL')."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Stock ticker symbol (e.g. 'AMZN')"
                }
            },
            "required": ["symbol"]
        })
    }

    async fn invoke(&self, arguments: Value) -> String {
        let args: RealtimeArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return error_payload(e),
        };
        let mut result = self.use_case.execute(&args.symbol).await;
        // One retry on a timed-out backend call
        if matches!(result, Err(stock_core::AgentError::Timeout(_))) {
            result = self.use_case.execute(&args.symbol).await;
        }
        match result {
            Ok(price) => serde_json::to_string(&price).unwrap_or_else(|e| error_payload(e)),
            Err(e) => error_payload(e),
        }
    }
}

/// Tool wrapper around the historical prices use case.
pub struct HistoricalPricesTool {
    use_case: GetHistoricalPricesUseCase,
}

impl HistoricalPricesTool {
    pub fn new(use_case: GetHistoricalPricesUseCase) -> Self {
        Self { use_case }
    }
}

fn default_period() -> String {
    "3mo".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}

#[derive(Deserialize)]
struct HistoricalArgs {
    symbol: String,
    #[serde(default = "default_period")]
    period: String,
    #[serde(default = "default_interval")]
    interval: String,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

#[async_trait]
impl AgentTool for HistoricalPricesTool {
    fn name(&self) -> &'static str {
        "retrieve_historical_stock_price"
    }

    fn description(&self) -> &'static str {
        "Retrieve historical OHLCV stock prices for a given ticker symbol. \
         Period accepts 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max and \
         is ignored when start_date is set; dates use YYYY-MM-DD."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Stock ticker symbol (e.g. 'AMZN')"
                },
                "period": {
                    "type": "string",
                    "description": "Relative time period, ignored when start_date is set"
                },
                "interval": {
                    "type": "string",
                    "description": "Bar frequency (e.g. '1d', '1wk', '1mo')"
                },
                "start_date": {
                    "type": "string",
                    "description": "Start date in YYYY-MM-DD format, overrides period"
                },
                "end_date": {
                    "type": "string",
                    "description": "End date in YYYY-MM-DD format, defaults to today"
                }
            },
            "required": ["symbol"]
        })
    }

    async fn invoke(&self, arguments: Value) -> String {
        let args: HistoricalArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return error_payload(e),
        };
        let mut result = self
            .use_case
            .execute(
                &args.symbol,
                &args.period,
                &args.interval,
                args.start_date.as_deref(),
                args.end_date.as_deref(),
            )
            .await;
        // One retry on a timed-out backend call
        if matches!(result, Err(stock_core::AgentError::Timeout(_))) {
            result = self
                .use_case
                .execute(
                    &args.symbol,
                    &args.period,
                    &args.interval,
                    args.start_date.as_deref(),
                    args.end_date.as_deref(),
                )
                .await;
        }
        match result {
            Ok(prices) => serde_json::to_string(&prices).unwrap_or_else(|e| error_payload(e)),
            Err(e) => error_payload(e),
        }
    }
}
