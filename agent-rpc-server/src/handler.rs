use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;
use stock_agent::use_cases::RunAgentUseCase;
use tokio::sync::mpsc;

use crate::auth::TokenValidator;
use crate::error::RpcError;
use crate::protocol::{AgentQueryRequest, AgentQueryResult, JsonRpcNotification};

/// Handler for agent queries
pub struct AgentQueryHandler {
    run_use_case: Arc<RunAgentUseCase>,
    validator: Arc<TokenValidator>,
}

impl AgentQueryHandler {
    pub fn new(run_use_case: Arc<RunAgentUseCase>, validator: Arc<TokenValidator>) -> Self {
        Self {
            run_use_case,
            validator,
        }
    }

    /// Handle an agent.query request.
    ///
    /// Emits one `agent.event` notification per agent event through
    /// `notifications` while the run streams, then returns the final
    /// result. A run failure becomes an `AgentFailed` error, distinct
    /// from normal completion. A closed notification channel means the
    /// client is gone; the stream stops being pulled, which cancels the
    /// run at its next suspension point.
    pub async fn handle_query(
        &self,
        request_id: Option<Value>,
        params: AgentQueryRequest,
        notifications: mpsc::Sender<Value>,
    ) -> Result<AgentQueryResult, RpcError> {
        let claims = self.validator.validate(&params.token)?;

        tracing::debug!(
            user_id = %claims.sub,
            session_id = params.session_id.as_deref().unwrap_or("-"),
            "handling agent query"
        );

        let stream = self.run_use_case.execute(
            &params.prompt,
            Some(claims.sub),
            params.session_id.clone(),
        );
        futures::pin_mut!(stream);

        let mut events = 0usize;
        while let Some(item) = stream.next().await {
            let event = item?;
            events += 1;

            let notification = JsonRpcNotification::event(&request_id, &event);
            if notifications
                .send(serde_json::to_value(&notification)?)
                .await
                .is_err()
            {
                tracing::debug!("client disconnected mid-run, cancelling");
                break;
            }
        }

        tracing::info!(events, "agent query completed");
        Ok(AgentQueryResult { done: true, events })
    }
}
