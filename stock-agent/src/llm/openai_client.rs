use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessage,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestToolMessage, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, ChatCompletionTool, ChatCompletionToolType,
        CreateChatCompletionRequest, FunctionCall, FunctionObject,
    },
    Client as OpenAiClient,
};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde_json::Value;
use stock_core::{AgentError, ChatMessage, Role, ToolCall};
use tokio::time::sleep;

use super::language_model::{LanguageModel, ToolSchema};

/// Configuration for the chat model client
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub requests_per_minute: u32,
    pub timeout_seconds: u64,
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4-turbo".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
            requests_per_minute: 30,
            timeout_seconds: 30,
            max_retries: 3,
        }
    }
}

/// OpenAI chat-completions adapter with rate limiting and retry logic.
///
/// Tool schemas are bound at construction via `bind_tools`; `invoke` then
/// exposes exactly that set on every call. A timed-out model call is fatal
/// (no retry); transient API errors are retried with exponential backoff.
pub struct OpenAiChatModel {
    client: OpenAiClient<OpenAIConfig>,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    config: LlmConfig,
    tools: Vec<ChatCompletionTool>,
}

impl OpenAiChatModel {
    pub fn new(config: LlmConfig, api_key: String) -> Result<Self, AgentError> {
        tracing::info!(
            "Initializing chat model client: model={}, rate_limit={}/min",
            config.model,
            config.requests_per_minute
        );

        let client = OpenAiClient::with_config(OpenAIConfig::new().with_api_key(api_key));

        let requests_per_minute = NonZeroU32::new(config.requests_per_minute).ok_or_else(|| {
            AgentError::InvalidArgument("requests_per_minute must be > 0".to_string())
        })?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(requests_per_minute)));

        Ok(Self {
            client,
            rate_limiter,
            config,
            tools: Vec::new(),
        })
    }

    /// Return a new client with the given tool schemas bound for
    /// function-calling. The underlying connection and limits are shared.
    pub fn bind_tools(&self, schemas: &[ToolSchema]) -> Self {
        let tools = schemas
            .iter()
            .map(|s| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: s.name.clone(),
                    description: Some(s.description.clone()),
                    parameters: Some(s.parameters.clone()),
                    strict: None,
                },
            })
            .collect();

        Self {
            client: self.client.clone(),
            rate_limiter: Arc::clone(&self.rate_limiter),
            config: self.config.clone(),
            tools,
        }
    }

    async fn call_api(&self, messages: &[ChatMessage]) -> Result<ChatMessage, AgentError> {
        let request = CreateChatCompletionRequest {
            model: self.config.model.clone(),
            messages: to_openai_messages(messages),
            tools: if self.tools.is_empty() {
                None
            } else {
                Some(self.tools.clone())
            },
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            ..Default::default()
        };

        let response = tokio::time::timeout(
            Duration::from_secs(self.config.timeout_seconds),
            self.client.chat().create(request),
        )
        .await
        .map_err(|_| AgentError::Timeout(self.config.timeout_seconds))?
        .map_err(|e| AgentError::Model(format!("OpenAI API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Model("empty response from model".to_string()))?;

        let content = choice.message.content.unwrap_or_default();
        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(from_openai_tool_call)
            .collect();

        Ok(ChatMessage::assistant(content, tool_calls))
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatMessage, AgentError> {
        self.rate_limiter.until_ready().await;

        tracing::debug!(history_len = messages.len(), "invoking chat model");

        let mut last_error = None;
        for attempt in 0..self.config.max_retries {
            match self.call_api(messages).await {
                Ok(response) => {
                    tracing::debug!(
                        tool_calls = response.tool_calls.len(),
                        content_len = response.content.len(),
                        "model response received"
                    );
                    return Ok(response);
                }
                // A timed-out call is fatal at the model boundary
                Err(AgentError::Timeout(secs)) => return Err(AgentError::Timeout(secs)),
                Err(e) => {
                    last_error = Some(e);
                    if attempt + 1 < self.config.max_retries {
                        let backoff_ms = 2_u64.pow(attempt) * 1000;
                        tracing::warn!(
                            "model call failed (attempt {}/{}), retrying in {}ms: {}",
                            attempt + 1,
                            self.config.max_retries,
                            backoff_ms,
                            last_error.as_ref().unwrap()
                        );
                        sleep(Duration::from_millis(backoff_ms)).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AgentError::Model("all retry attempts failed".to_string())))
    }
}

fn to_openai_messages(messages: &[ChatMessage]) -> Vec<ChatCompletionRequestMessage> {
    messages
        .iter()
        .map(|m| match m.role {
            Role::System => {
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    content: m.content.clone().into(),
                    name: None,
                })
            }
            Role::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(m.content.clone()),
                name: None,
            }),
            Role::Assistant => {
                ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                    content: if m.content.is_empty() {
                        None
                    } else {
                        Some(m.content.clone().into())
                    },
                    tool_calls: if m.tool_calls.is_empty() {
                        None
                    } else {
                        Some(m.tool_calls.iter().map(to_openai_tool_call).collect())
                    },
                    ..Default::default()
                })
            }
            Role::Tool => ChatCompletionRequestMessage::Tool(ChatCompletionRequestToolMessage {
                content: m.content.clone().into(),
                tool_call_id: m.tool_call_id.clone().unwrap_or_default(),
            }),
        })
        .collect()
}

fn to_openai_tool_call(call: &ToolCall) -> ChatCompletionMessageToolCall {
    ChatCompletionMessageToolCall {
        id: call.id.clone(),
        r#type: ChatCompletionToolType::Function,
        function: FunctionCall {
            name: call.name.clone(),
            arguments: call.arguments.to_string(),
        },
    }
}

fn from_openai_tool_call(call: ChatCompletionMessageToolCall) -> ToolCall {
    // Arguments arrive as a JSON string; a malformed payload becomes an
    // empty object the tool can reject itself
    let arguments = serde_json::from_str::<Value>(&call.function.arguments)
        .unwrap_or_else(|_| serde_json::json!({}));
    ToolCall {
        id: call.id,
        name: call.function.name,
        arguments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LlmConfig::default();
        assert_eq!(config.model, "gpt-4-turbo");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_message_conversion_preserves_roles() {
        let history = vec![
            ChatMessage::system("You are a financial research assistant."),
            ChatMessage::user("What is AMZN trading at?"),
            ChatMessage::assistant(
                "",
                vec![ToolCall {
                    id: "call_0".to_string(),
                    name: "retrieve_realtime_stock_price".to_string(),
                    arguments: serde_json::json!({"symbol": "AMZN"}),
                }],
            ),
            ChatMessage::tool("{\"current_price\": 224.3}", "call_0"),
        ];

        let converted = to_openai_messages(&history);
        assert_eq!(converted.len(), 4);
        assert!(matches!(
            converted[2],
            ChatCompletionRequestMessage::Assistant(_)
        ));
        assert!(matches!(converted[3], ChatCompletionRequestMessage::Tool(_)));
    }

    #[test]
    fn test_malformed_arguments_become_empty_object() {
        let call = ChatCompletionMessageToolCall {
            id: "call_1".to_string(),
            r#type: ChatCompletionToolType::Function,
            function: FunctionCall {
                name: "retrieve_financial_documents".to_string(),
                arguments: "not json".to_string(),
            },
        };
        let parsed = from_openai_tool_call(call);
        assert_eq!(parsed.arguments, serde_json::json!({}));
        assert_eq!(parsed.name, "retrieve_financial_documents");
    }
}
