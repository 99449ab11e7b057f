use stock_core::AgentError;

use crate::agent::AgentEvent;

/// Caller-supplied correlation metadata attached to every run for
/// downstream tracing.
#[derive(Debug, Clone, Default)]
pub struct RunMetadata {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

/// Passive observation hook for agent runs. Observers must not alter the
/// reasoning logic; they only watch.
pub trait AgentObserver: Send + Sync {
    fn on_run_start(&self, query: &str, meta: &RunMetadata);
    fn on_event(&self, meta: &RunMetadata, event: &AgentEvent);
    fn on_run_end(&self, meta: &RunMetadata, error: Option<&AgentError>);
    /// Drain buffered telemetry before process exit.
    fn flush(&self);
}

/// Observer that emits structured tracing events with the run's
/// correlation fields.
pub struct TracingObserver;

impl AgentObserver for TracingObserver {
    fn on_run_start(&self, query: &str, meta: &RunMetadata) {
        tracing::info!(
            user_id = meta.user_id.as_deref().unwrap_or("-"),
            session_id = meta.session_id.as_deref().unwrap_or("-"),
            query_len = query.len(),
            "agent run started"
        );
    }

    fn on_event(&self, meta: &RunMetadata, event: &AgentEvent) {
        tracing::debug!(
            user_id = meta.user_id.as_deref().unwrap_or("-"),
            session_id = meta.session_id.as_deref().unwrap_or("-"),
            node = ?event.node,
            kind = %event.kind,
            content_len = event.content.len(),
            "agent event"
        );
    }

    fn on_run_end(&self, meta: &RunMetadata, error: Option<&AgentError>) {
        match error {
            None => tracing::info!(
                user_id = meta.user_id.as_deref().unwrap_or("-"),
                session_id = meta.session_id.as_deref().unwrap_or("-"),
                "agent run completed"
            ),
            Some(e) => tracing::warn!(
                user_id = meta.user_id.as_deref().unwrap_or("-"),
                session_id = meta.session_id.as_deref().unwrap_or("-"),
                error = %e,
                "agent run failed"
            ),
        }
    }

    fn flush(&self) {
        // tracing subscribers flush on write; nothing buffered here
    }
}
