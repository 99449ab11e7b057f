use std::sync::Arc;

use serde::Serialize;
use stock_core::{AgentError, ChatMessage, Role};

use super::prompts::SYSTEM_PROMPT;
use crate::llm::LanguageModel;
use crate::tools::ToolRegistry;

/// Which node of the loop produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentNode {
    Reason,
    Act,
}

/// One event per node transition of a run: the producing node, the newest
/// message's content, and its role kind.
#[derive(Debug, Clone, Serialize)]
pub struct AgentEvent {
    pub node: AgentNode,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Loop policy.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub system_prompt: String,
    /// Cap on model invocations per run, counting the first
    pub recursion_limit: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            recursion_limit: 10,
        }
    }
}

/// Factory for agent runs: a language model with tools bound, the tool
/// dispatch table, and the loop policy. Cheap to share; every run owns its
/// own message history and never touches another run's state.
pub struct AgentGraph {
    llm: Arc<dyn LanguageModel>,
    tools: Arc<ToolRegistry>,
    config: Arc<AgentConfig>,
}

impl AgentGraph {
    pub fn new(llm: Arc<dyn LanguageModel>, tools: Arc<ToolRegistry>, config: AgentConfig) -> Self {
        Self {
            llm,
            tools,
            config: Arc::new(config),
        }
    }

    /// Start a run for one user query.
    pub fn run(&self, query: &str) -> AgentRun {
        AgentRun {
            llm: Arc::clone(&self.llm),
            tools: Arc::clone(&self.tools),
            config: Arc::clone(&self.config),
            messages: vec![ChatMessage::user(query)],
            model_calls: 0,
            next: NextNode::Reason,
        }
    }
}

enum NextNode {
    Reason,
    Act,
    Done,
}

/// One in-flight run of the reason/act state machine.
///
/// `next_event` drives exactly one node and returns its event; `Ok(None)`
/// marks normal completion, after which nothing further happens. An error
/// terminates the run; subsequent calls return `Ok(None)`. Dropping the
/// run between calls cancels it: suspension points are the model call and
/// the backend calls inside tools, and a partially built history is simply
/// discarded.
pub struct AgentRun {
    llm: Arc<dyn LanguageModel>,
    tools: Arc<ToolRegistry>,
    config: Arc<AgentConfig>,
    messages: Vec<ChatMessage>,
    model_calls: u32,
    next: NextNode,
}

impl AgentRun {
    pub async fn next_event(&mut self) -> Result<Option<AgentEvent>, AgentError> {
        match self.next {
            NextNode::Reason => match self.reason().await {
                Ok(event) => Ok(Some(event)),
                Err(e) => {
                    self.next = NextNode::Done;
                    Err(e)
                }
            },
            NextNode::Act => match self.act().await {
                Ok(event) => Ok(Some(event)),
                Err(e) => {
                    self.next = NextNode::Done;
                    Err(e)
                }
            },
            NextNode::Done => Ok(None),
        }
    }

    /// Reasoning step: ensure the system prompt leads the history, then ask
    /// the model what to do next.
    async fn reason(&mut self) -> Result<AgentEvent, AgentError> {
        if !matches!(self.messages.first(), Some(m) if m.role == Role::System) {
            self.messages
                .insert(0, ChatMessage::system(self.config.system_prompt.clone()));
        }

        if self.model_calls >= self.config.recursion_limit {
            return Err(AgentError::RecursionLimitExceeded(
                self.config.recursion_limit,
            ));
        }
        self.model_calls += 1;

        let response = self.llm.invoke(&self.messages).await?;
        tracing::debug!(
            model_calls = self.model_calls,
            tool_calls = response.tool_calls.len(),
            "reason step complete"
        );

        self.next = if response.has_tool_calls() {
            NextNode::Act
        } else {
            NextNode::Done
        };

        let event = AgentEvent {
            node: AgentNode::Reason,
            content: response.content.clone(),
            kind: response.kind().to_string(),
        };
        self.messages.push(response);
        Ok(event)
    }

    /// Action step: dispatch every tool call requested by the last
    /// assistant message, in the order they appear, and append one result
    /// message per call with the matching call id.
    async fn act(&mut self) -> Result<AgentEvent, AgentError> {
        let calls = self
            .messages
            .last()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.tool_calls.clone())
            .unwrap_or_default();

        let mut results = Vec::with_capacity(calls.len());
        for call in &calls {
            let tool = self
                .tools
                .get(&call.name)
                .ok_or_else(|| AgentError::UnknownTool(call.name.clone()))?;

            tracing::debug!(tool = %call.name, call_id = %call.id, "dispatching tool");
            let output = tool.invoke(call.arguments.clone()).await;
            results.push(ChatMessage::tool(output, call.id.clone()));
        }

        let event = results
            .last()
            .map(|m| AgentEvent {
                node: AgentNode::Act,
                content: m.content.clone(),
                kind: m.kind().to_string(),
            })
            .unwrap_or_else(|| AgentEvent {
                node: AgentNode::Act,
                content: String::new(),
                kind: "tool".to_string(),
            });

        self.messages.extend(results);
        self.next = NextNode::Reason;
        Ok(event)
    }

    /// Number of model invocations so far in this run.
    pub fn model_calls(&self) -> u32 {
        self.model_calls
    }

    #[cfg(test)]
    pub(crate) fn history(&self) -> &[ChatMessage] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use stock_core::ToolCall;

    /// Scripted model: pops responses front-first, panics when exhausted.
    struct ScriptedModel {
        responses: Mutex<Vec<ChatMessage>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<ChatMessage>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn invoke(&self, _messages: &[ChatMessage]) -> Result<ChatMessage, AgentError> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(AgentError::Model("script exhausted".to_string()));
            }
            Ok(responses.remove(0))
        }
    }

    struct StaticTool;

    #[async_trait]
    impl crate::tools::AgentTool for StaticTool {
        fn name(&self) -> &'static str {
            "retrieve_financial_documents"
        }
        fn description(&self) -> &'static str {
            "canned passages"
        }
        fn parameters(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn invoke(&self, _arguments: serde_json::Value) -> String {
            "[Source: q3-earnings.txt, Page: 1]\nnet sales increased 11%".to_string()
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        Arc::new(ToolRegistry::new(vec![Arc::new(StaticTool)]))
    }

    fn call(name: &str) -> ToolCall {
        ToolCall {
            id: "call_0".to_string(),
            name: name.to_string(),
            arguments: serde_json::json!({"query": "q3 revenue"}),
        }
    }

    #[tokio::test]
    async fn test_direct_answer_is_one_reason_event() {
        let model = ScriptedModel::new(vec![ChatMessage::assistant("AMZN trades around $224.", vec![])]);
        let graph = AgentGraph::new(model, registry(), AgentConfig::default());
        let mut run = graph.run("What is AMZN trading at?");

        let event = run.next_event().await.unwrap().unwrap();
        assert_eq!(event.node, AgentNode::Reason);
        assert_eq!(event.kind, "ai");
        assert!(run.next_event().await.unwrap().is_none());
        assert_eq!(run.model_calls(), 1);
    }

    #[tokio::test]
    async fn test_system_prompt_prepended_exactly_once() {
        let model = ScriptedModel::new(vec![
            ChatMessage::assistant("", vec![call("retrieve_financial_documents")]),
            ChatMessage::assistant("Q3 2025 net sales were $158.9B.", vec![]),
        ]);
        let graph = AgentGraph::new(model, registry(), AgentConfig::default());
        let mut run = graph.run("What was AMZN's Q3 2025 revenue?");

        while run.next_event().await.unwrap().is_some() {}

        let system_count = run
            .history()
            .iter()
            .filter(|m| m.role == Role::System)
            .count();
        assert_eq!(system_count, 1);
        assert_eq!(run.history()[0].role, Role::System);
        assert_ne!(run.history()[1].role, Role::System);
    }

    #[tokio::test]
    async fn test_tool_results_match_call_ids_in_order() {
        let calls = vec![
            ToolCall {
                id: "call_a".to_string(),
                name: "retrieve_financial_documents".to_string(),
                arguments: serde_json::json!({"query": "revenue"}),
            },
            ToolCall {
                id: "call_b".to_string(),
                name: "retrieve_financial_documents".to_string(),
                arguments: serde_json::json!({"query": "guidance"}),
            },
        ];
        let model = ScriptedModel::new(vec![
            ChatMessage::assistant("", calls),
            ChatMessage::assistant("done", vec![]),
        ]);
        let graph = AgentGraph::new(model, registry(), AgentConfig::default());
        let mut run = graph.run("revenue and guidance?");

        while run.next_event().await.unwrap().is_some() {}

        let result_ids: Vec<&str> = run
            .history()
            .iter()
            .filter(|m| m.role == Role::Tool)
            .map(|m| m.tool_call_id.as_deref().unwrap())
            .collect();
        assert_eq!(result_ids, vec!["call_a", "call_b"]);
    }

    #[tokio::test]
    async fn test_unknown_tool_fails_the_run() {
        let model = ScriptedModel::new(vec![ChatMessage::assistant(
            "",
            vec![call("nonexistent_tool")],
        )]);
        let graph = AgentGraph::new(model, registry(), AgentConfig::default());
        let mut run = graph.run("anything");

        run.next_event().await.unwrap();
        let err = run.next_event().await.unwrap_err();
        assert!(matches!(err, AgentError::UnknownTool(name) if name == "nonexistent_tool"));
        // Terminated: no further events
        assert!(run.next_event().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recursion_limit_stops_endless_tool_loops() {
        // Model that always requests another tool call
        let responses: Vec<ChatMessage> = (0..12)
            .map(|_| ChatMessage::assistant("", vec![call("retrieve_financial_documents")]))
            .collect();
        let model = ScriptedModel::new(responses);
        let graph = AgentGraph::new(model, registry(), AgentConfig::default());
        let mut run = graph.run("loop forever");

        let mut events = 0usize;
        let err = loop {
            match run.next_event().await {
                Ok(Some(_)) => events += 1,
                Ok(None) => panic!("run completed without hitting the cap"),
                Err(e) => break e,
            }
        };

        assert!(matches!(err, AgentError::RecursionLimitExceeded(10)));
        assert_eq!(run.model_calls(), 10);
        // 10 reason events + 10 act events before the 11th reason fails
        assert_eq!(events, 20);
        assert!(run.next_event().await.unwrap().is_none());
    }
}
