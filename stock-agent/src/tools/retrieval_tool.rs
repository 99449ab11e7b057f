use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{error_payload, AgentTool};
use crate::use_cases::RetrieveDocumentsUseCase;

/// Tool wrapper around semantic search in the financial knowledge base.
pub struct RetrieveDocumentsTool {
    use_case: RetrieveDocumentsUseCase,
}

impl RetrieveDocumentsTool {
    pub fn new(use_case: RetrieveDocumentsUseCase) -> Self {
        Self { use_case }
    }
}

#[derive(Deserialize)]
struct RetrievalArgs {
    query: String,
}

#[async_trait]
impl AgentTool for RetrieveDocumentsTool {
    fn name(&self) -> &'static str {
        "retrieve_financial_documents"
    }

    fn description(&self) -> &'static str {
        "Search the indexed financial filings (annual report and quarterly \
         earnings releases) for passages relevant to the query. Use this for \
         questions about financials, business operations, earnings, revenue \
         breakdowns, guidance, or qualitative analysis. Returns passages \
         tagged with source file and page number, or an empty string when \
         nothing relevant is found."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Natural-language search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, arguments: Value) -> String {
        let args: RetrievalArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return error_payload(e),
        };
        match self
            .use_case
            .execute(&args.query, RetrieveDocumentsUseCase::DEFAULT_K)
        {
            Ok(passages) => passages,
            Err(e) => error_payload(e),
        }
    }
}
