use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use stock_core::{AgentError, HistoricalRecord, StockPrice};

use super::provider::{HistoryRange, StockDataProvider};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Market data adapter over the public Yahoo Finance quote and chart
/// endpoints. Quotes are fetched fresh on every call; nothing is cached.
pub struct YahooFinanceProvider {
    http: reqwest::Client,
    base_url: String,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, AgentError> {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    /// Point the provider at a different host (test servers).
    pub fn with_base_url(base_url: String) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("stock-agent/0.1")
            .build()
            .map_err(|e| AgentError::DataUnavailable(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: String) -> Result<T, AgentError> {
        let response = self.http.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                AgentError::Timeout(REQUEST_TIMEOUT_SECS)
            } else {
                AgentError::DataUnavailable(format!("request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            return Err(AgentError::DataUnavailable(format!(
                "backend returned status {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AgentError::DataUnavailable(format!("malformed response: {}", e)))
    }
}

#[async_trait]
impl StockDataProvider for YahooFinanceProvider {
    async fn quote(&self, symbol: &str) -> Result<StockPrice, AgentError> {
        let url = format!("{}/v7/finance/quote?symbols={}", self.base_url, symbol);
        tracing::debug!(symbol, "fetching realtime quote");

        let body: QuoteEnvelope = self.get_json(url).await?;
        let result = body
            .quote_response
            .and_then(|r| r.result.into_iter().next())
            .ok_or_else(|| {
                AgentError::DataUnavailable(format!("no quote data for symbol: {}", symbol))
            })?;

        if result.regular_market_price.is_none() {
            return Err(AgentError::DataUnavailable(format!(
                "no price data for symbol: {}",
                symbol
            )));
        }

        Ok(StockPrice {
            symbol: symbol.to_string(),
            current_price: result.regular_market_price,
            previous_close: result.regular_market_previous_close,
            open: result.regular_market_open,
            day_high: result.regular_market_day_high,
            day_low: result.regular_market_day_low,
            volume: result.regular_market_volume,
            currency: result.currency.unwrap_or_else(|| "USD".to_string()),
            market_state: result.market_state.unwrap_or_else(|| "UNKNOWN".to_string()),
        })
    }

    async fn history(
        &self,
        symbol: &str,
        range: &HistoryRange,
        interval: &str,
    ) -> Result<Vec<HistoricalRecord>, AgentError> {
        let window = match range {
            HistoryRange::Period(period) => format!("range={}", period),
            HistoryRange::Dates { start, end } => format!(
                "period1={}&period2={}",
                epoch_seconds(*start),
                // period2 is exclusive upstream; include the end day itself
                epoch_seconds(end.succ_opt().unwrap_or(*end))
            ),
        };
        let url = format!(
            "{}/v8/finance/chart/{}?interval={}&{}",
            self.base_url, symbol, interval, window
        );
        tracing::debug!(symbol, interval, ?range, "fetching historical bars");

        let body: ChartEnvelope = self.get_json(url).await?;
        let result = body
            .chart
            .and_then(|c| c.result)
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| {
                AgentError::DataUnavailable(format!("no historical data for symbol: {}", symbol))
            })?;

        let timestamps = result.timestamp.unwrap_or_default();
        let quote = result
            .indicators
            .and_then(|i| i.quote.into_iter().next())
            .unwrap_or_default();

        let mut records = Vec::with_capacity(timestamps.len());
        for (idx, ts) in timestamps.iter().enumerate() {
            let bar = (
                value_at(&quote.open, idx),
                value_at(&quote.high, idx),
                value_at(&quote.low, idx),
                value_at(&quote.close, idx),
            );
            // Bars with any missing price field are not observations
            let (Some(open), Some(high), Some(low), Some(close)) = bar else {
                continue;
            };
            let date = DateTime::<Utc>::from_timestamp(*ts, 0)
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            records.push(HistoricalRecord {
                date,
                open: round4(open),
                high: round4(high),
                low: round4(low),
                close: round4(close),
                volume: value_at(&quote.volume, idx).unwrap_or(0),
            });
        }

        if records.is_empty() {
            return Err(AgentError::DataUnavailable(format!(
                "no historical data for symbol: {}",
                symbol
            )));
        }
        Ok(records)
    }
}

fn value_at<T: Copy>(values: &[Option<T>], idx: usize) -> Option<T> {
    values.get(idx).copied().flatten()
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

fn epoch_seconds(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

// ---------------------------------------------------------------------------
// Response DTOs (only the fields we read)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: Option<QuoteResponse>,
}

#[derive(Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<QuoteResult>,
}

#[derive(Deserialize)]
struct QuoteResult {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "regularMarketPreviousClose")]
    regular_market_previous_close: Option<f64>,
    #[serde(rename = "regularMarketOpen")]
    regular_market_open: Option<f64>,
    #[serde(rename = "regularMarketDayHigh")]
    regular_market_day_high: Option<f64>,
    #[serde(rename = "regularMarketDayLow")]
    regular_market_day_low: Option<f64>,
    #[serde(rename = "regularMarketVolume")]
    regular_market_volume: Option<u64>,
    currency: Option<String>,
    #[serde(rename = "marketState")]
    market_state: Option<String>,
}

#[derive(Deserialize)]
struct ChartEnvelope {
    chart: Option<Chart>,
}

#[derive(Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBars>,
}

#[derive(Deserialize, Default)]
struct QuoteBars {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}
