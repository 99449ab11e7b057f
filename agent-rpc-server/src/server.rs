use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use stock_agent::agent::{AgentConfig, AgentGraph};
use stock_agent::llm::{LlmConfig, OpenAiChatModel};
use stock_agent::observability::TracingObserver;
use stock_agent::tools::{
    HistoricalPricesTool, RealtimePriceTool, RetrieveDocumentsTool, ToolRegistry,
};
use stock_agent::use_cases::{
    GetHistoricalPricesUseCase, GetRealtimePriceUseCase, RetrieveDocumentsUseCase, RunAgentUseCase,
};
use stock_data_services::{FastembedEmbedder, VectorIndex, YahooFinanceProvider};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::auth::TokenValidator;
use crate::config::ServerConfig;
use crate::error::RpcError;
use crate::handler::AgentQueryHandler;
use crate::protocol::*;

/// JSON-RPC server for agent queries
pub struct RpcServer {
    config: ServerConfig,
    handler: Arc<AgentQueryHandler>,
}

impl RpcServer {
    /// Composition root: wire the knowledge base, market data backend,
    /// language model, tools, and control loop once at startup.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        tracing::info!("Initializing agent components...");

        let embedder =
            Arc::new(FastembedEmbedder::new().context("Failed to load embedding model")?);
        let index = Arc::new(
            VectorIndex::load(&config.index_dir, embedder)
                .context("Failed to load vector index; run kb-ingest first")?,
        );

        let provider =
            Arc::new(YahooFinanceProvider::new().context("Failed to build market data client")?);

        let registry = Arc::new(ToolRegistry::new(vec![
            Arc::new(RealtimePriceTool::new(GetRealtimePriceUseCase::new(
                provider.clone(),
            ))),
            Arc::new(HistoricalPricesTool::new(GetHistoricalPricesUseCase::new(
                provider,
            ))),
            Arc::new(RetrieveDocumentsTool::new(RetrieveDocumentsUseCase::new(
                index,
            ))),
        ]));

        let api_key =
            std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;
        let llm = OpenAiChatModel::new(
            LlmConfig {
                model: config.model.clone(),
                ..Default::default()
            },
            api_key,
        )?;
        let llm = Arc::new(llm.bind_tools(&registry.schemas()));

        let graph = Arc::new(AgentGraph::new(
            llm,
            registry,
            AgentConfig {
                recursion_limit: config.recursion_limit,
                ..Default::default()
            },
        ));
        let run_use_case = Arc::new(RunAgentUseCase::new(graph, Arc::new(TracingObserver)));
        let validator = Arc::new(TokenValidator::new(&config.auth_keys));
        let handler = Arc::new(AgentQueryHandler::new(run_use_case, validator));

        tracing::info!("Agent components initialized successfully");

        Ok(Self { config, handler })
    }

    /// Start the server and handle connections
    pub async fn run(&self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .context(format!("Failed to bind to {}", addr))?;

        tracing::info!("Agent JSON-RPC server listening on {}", addr);

        loop {
            match listener.accept().await {
                Ok((socket, addr)) => {
                    tracing::debug!("New connection from {}", addr);
                    let handler = Arc::clone(&self.handler);

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(socket, handler).await {
                            tracing::error!("Connection error from {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Handle a single TCP connection: one line in, a stream of notification
/// lines plus a final response line out, repeated until the peer closes.
async fn handle_connection(mut socket: TcpStream, handler: Arc<AgentQueryHandler>) -> Result<()> {
    let (reader, mut writer) = socket.split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            // Connection closed
            break;
        }

        tracing::debug!("Received request: {}", line.trim());
        process_request(&line, &handler, &mut writer).await?;
    }

    Ok(())
}

/// Process one JSON-RPC request, writing every output line to `writer`.
async fn process_request<W>(
    line: &str,
    handler: &AgentQueryHandler,
    writer: &mut W,
) -> Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(req) => req,
        Err(e) => {
            let response = error_response(None, RpcError::ParseError(e.to_string()));
            return write_line(writer, &response).await;
        }
    };

    if request.jsonrpc != "2.0" {
        let response = error_response(
            request.id,
            RpcError::InvalidRequest("JSON-RPC version must be 2.0".to_string()),
        );
        return write_line(writer, &response).await;
    }

    match request.method.as_str() {
        "agent.query" => handle_agent_query(request, handler, writer).await,
        _ => {
            let response = error_response(
                request.id,
                RpcError::MethodNotFound(request.method.clone()),
            );
            write_line(writer, &response).await
        }
    }
}

/// Handle the agent.query method, interleaving event notifications with
/// the in-flight run and finishing with a single response line.
async fn handle_agent_query<W>(
    request: JsonRpcRequest,
    handler: &AgentQueryHandler,
    writer: &mut W,
) -> Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let params: AgentQueryRequest = match request.params {
        Some(params) => match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                let response =
                    error_response(request.id, RpcError::InvalidParams(e.to_string()));
                return write_line(writer, &response).await;
            }
        },
        None => {
            let response = error_response(
                request.id,
                RpcError::InvalidParams("Missing params".to_string()),
            );
            return write_line(writer, &response).await;
        }
    };

    let (tx, mut rx) = mpsc::channel::<Value>(16);
    let query_fut = handler.handle_query(request.id.clone(), params, tx);
    tokio::pin!(query_fut);

    let mut outcome: Option<Result<AgentQueryResult, RpcError>> = None;
    loop {
        tokio::select! {
            biased;
            maybe = rx.recv() => {
                match maybe {
                    Some(notification) => write_line(writer, &notification).await?,
                    // Handler finished and the channel drained
                    None => break,
                }
            }
            result = &mut query_fut, if outcome.is_none() => {
                outcome = Some(result);
            }
        }
    }

    let response = match outcome.expect("query future completed") {
        Ok(result) => serde_json::to_value(JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id: request.id,
            result: serde_json::to_value(result)?,
        })?,
        Err(e) => error_response(request.id, e),
    };
    write_line(writer, &response).await
}

fn error_response(id: Option<Value>, error: RpcError) -> Value {
    serde_json::to_value(JsonRpcError {
        jsonrpc: "2.0".to_string(),
        id,
        error: ErrorObject {
            code: error.code(),
            message: error.to_string(),
            data: error.data(),
        },
    })
    .expect("error response serializes")
}

async fn write_line<W>(writer: &mut W, value: &Value) -> Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let json = serde_json::to_string(value)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
