pub mod get_historical_prices;
pub mod get_realtime_price;
pub mod retrieve_documents;
pub mod run_agent;

// Re-export commonly used items
pub use get_historical_prices::GetHistoricalPricesUseCase;
pub use get_realtime_price::GetRealtimePriceUseCase;
pub use retrieve_documents::RetrieveDocumentsUseCase;
pub use run_agent::RunAgentUseCase;

pub(crate) fn normalize_symbol(symbol: &str) -> Result<String, stock_core::AgentError> {
    let normalized = symbol.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(stock_core::AgentError::InvalidArgument(
            "symbol must be a non-empty string".to_string(),
        ));
    }
    Ok(normalized)
}
