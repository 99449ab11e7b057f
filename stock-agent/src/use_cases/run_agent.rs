use std::sync::Arc;

use futures::stream::{self, Stream};
use stock_core::AgentError;

use crate::agent::{AgentEvent, AgentGraph};
use crate::observability::{AgentObserver, RunMetadata};

/// Use-case: execute one user query through the agent graph, surfacing
/// node events as they occur.
pub struct RunAgentUseCase {
    graph: Arc<AgentGraph>,
    observer: Arc<dyn AgentObserver>,
}

impl RunAgentUseCase {
    pub fn new(graph: Arc<AgentGraph>, observer: Arc<dyn AgentObserver>) -> Self {
        Self { graph, observer }
    }

    /// Stream agent events for `query`.
    ///
    /// The stream is lazy, finite, and non-restartable: each pull drives
    /// exactly one node of the run. A failure terminates the stream with
    /// a single `Err` item; normal completion simply ends it. Dropping the
    /// stream between pulls cancels the run.
    pub fn execute(
        &self,
        query: &str,
        user_id: Option<String>,
        session_id: Option<String>,
    ) -> impl Stream<Item = Result<AgentEvent, AgentError>> {
        let meta = RunMetadata {
            user_id,
            session_id,
        };
        self.observer.on_run_start(query, &meta);

        let run = self.graph.run(query);
        let observer = Arc::clone(&self.observer);

        stream::try_unfold((run, observer, meta), |(mut run, observer, meta)| async move {
            match run.next_event().await {
                Ok(Some(event)) => {
                    observer.on_event(&meta, &event);
                    Ok(Some((event, (run, observer, meta))))
                }
                Ok(None) => {
                    observer.on_run_end(&meta, None);
                    observer.flush();
                    Ok(None)
                }
                Err(e) => {
                    observer.on_run_end(&meta, Some(&e));
                    observer.flush();
                    Err(e)
                }
            }
        })
    }
}
