/// End-to-end scenarios for the agent control loop driven through the
/// streaming run use case, with a scripted language model and a real
/// vector index behind the retrieval tool.
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use stock_agent::agent::{AgentConfig, AgentGraph, AgentNode};
use stock_agent::llm::LanguageModel;
use stock_agent::observability::{AgentObserver, RunMetadata, TracingObserver};
use stock_agent::tools::{RetrieveDocumentsTool, ToolRegistry};
use stock_agent::use_cases::{RetrieveDocumentsUseCase, RunAgentUseCase};
use stock_agent::AgentEvent;
use stock_core::{AgentError, ChatMessage, DocumentChunk, ToolCall};
use stock_data_services::{HashEmbedder, VectorIndex};

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

fn retrieval_registry() -> Arc<ToolRegistry> {
    let mut index = VectorIndex::new(Arc::new(HashEmbedder::new()));
    index
        .add(&[DocumentChunk::new(
            "net sales increased 11% to 158.9 billion dollars in the third quarter of 2025",
            "q3-earnings.txt",
            1,
            0,
        )])
        .unwrap();
    let use_case = RetrieveDocumentsUseCase::new(Arc::new(index));
    Arc::new(ToolRegistry::new(vec![Arc::new(RetrieveDocumentsTool::new(
        use_case,
    ))]))
}

fn retrieval_call(id: &str, name: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: serde_json::json!({"query": "Q3 2025 revenue"}),
    }
}

fn use_case(model: Arc<dyn LanguageModel>) -> RunAgentUseCase {
    let graph = AgentGraph::new(model, retrieval_registry(), AgentConfig::default());
    RunAgentUseCase::new(Arc::new(graph), Arc::new(TracingObserver))
}

#[tokio::test]
async fn test_retrieval_round_trip_emits_reason_act_reason() {
    let model = ScriptedModel::new(vec![
        ChatMessage::assistant(
            "",
            vec![retrieval_call("call_0", "retrieve_financial_documents")],
        ),
        ChatMessage::assistant(
            "Q3 2025 net sales were $158.9B [Source: q3-earnings.txt, Page: 1].",
            vec![],
        ),
    ]);

    let events: Vec<AgentEvent> = use_case(model)
        .execute("What was AMZN's Q3 2025 revenue?", None, None)
        .map(|r| r.unwrap())
        .collect()
        .await;

    let nodes: Vec<AgentNode> = events.iter().map(|e| e.node).collect();
    assert_eq!(nodes, vec![AgentNode::Reason, AgentNode::Act, AgentNode::Reason]);

    // The act event surfaces the retrieved passage
    assert!(events[1].content.contains("158.9 billion"));
    assert_eq!(events[1].kind, "tool");
    assert_eq!(events[2].kind, "ai");
}

#[tokio::test]
async fn test_unknown_tool_terminates_with_no_further_events() {
    let model = ScriptedModel::new(vec![ChatMessage::assistant(
        "",
        vec![retrieval_call("call_0", "nonexistent_tool")],
    )]);

    let uc = use_case(model);
    let mut stream = Box::pin(uc.execute("anything", None, None));

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.node, AgentNode::Reason);

    let failure = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(failure, AgentError::UnknownTool(name) if name == "nonexistent_tool"));

    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_recursion_cap_reported_as_distinct_condition() {
    let responses: Vec<ChatMessage> = (0..11)
        .map(|i| {
            ChatMessage::assistant(
                "",
                vec![retrieval_call(
                    &format!("call_{}", i),
                    "retrieve_financial_documents",
                )],
            )
        })
        .collect();
    let model = ScriptedModel::new(responses);

    let uc = use_case(model);
    let mut stream = Box::pin(uc.execute("loop", None, None));

    let mut delivered = 0usize;
    let failure = loop {
        match stream.next().await.unwrap() {
            Ok(_) => delivered += 1,
            Err(e) => break e,
        }
    };

    assert!(matches!(failure, AgentError::RecursionLimitExceeded(10)));
    // 10 reason/act round trips streamed before the 11th model call is refused
    assert_eq!(delivered, 20);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_observer_sees_every_event_with_metadata() {
    #[derive(Default)]
    struct CountingObserver {
        events: Mutex<usize>,
        completed: Mutex<bool>,
        user_ids: Mutex<Vec<Option<String>>>,
    }

    impl AgentObserver for CountingObserver {
        fn on_run_start(&self, _query: &str, meta: &RunMetadata) {
            self.user_ids.lock().unwrap().push(meta.user_id.clone());
        }
        fn on_event(&self, _meta: &RunMetadata, _event: &AgentEvent) {
            *self.events.lock().unwrap() += 1;
        }
        fn on_run_end(&self, _meta: &RunMetadata, error: Option<&AgentError>) {
            *self.completed.lock().unwrap() = error.is_none();
        }
        fn flush(&self) {}
    }

    let model = ScriptedModel::new(vec![ChatMessage::assistant("No tools needed.", vec![])]);
    let graph = AgentGraph::new(model, retrieval_registry(), AgentConfig::default());
    let observer = Arc::new(CountingObserver::default());
    let use_case = RunAgentUseCase::new(Arc::new(graph), observer.clone());

    let events: Vec<_> = use_case
        .execute(
            "hello",
            Some("user-123".to_string()),
            Some("session-9".to_string()),
        )
        .collect()
        .await;

    assert_eq!(events.len(), 1);
    assert_eq!(*observer.events.lock().unwrap(), 1);
    assert!(*observer.completed.lock().unwrap());
    assert_eq!(
        observer.user_ids.lock().unwrap().as_slice(),
        &[Some("user-123".to_string())]
    );
}

#[tokio::test]
async fn test_concurrent_runs_are_isolated() {
    // Two runs with different scripts must not share history or events
    let uc_a = use_case(ScriptedModel::new(vec![ChatMessage::assistant(
        "answer a",
        vec![],
    )]));
    let uc_b = use_case(ScriptedModel::new(vec![
        ChatMessage::assistant(
            "",
            vec![retrieval_call("call_0", "retrieve_financial_documents")],
        ),
        ChatMessage::assistant("answer b", vec![]),
    ]));

    let (events_a, events_b) = tokio::join!(
        uc_a.execute("query a", None, None).collect::<Vec<_>>(),
        uc_b.execute("query b", None, None).collect::<Vec<_>>(),
    );

    assert_eq!(events_a.len(), 1);
    assert_eq!(events_b.len(), 3);
    assert_eq!(events_a[0].as_ref().unwrap().content, "answer a");
    assert_eq!(events_b[2].as_ref().unwrap().content, "answer b");
}
