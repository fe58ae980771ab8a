//! MCP session layer for the HTTP transport.
//!
//! Every Streamable HTTP session gets its own `HuntressService`, but all of
//! them share one `Dispatcher`, so the credential cache and the rate gate
//! stay process-wide.

use crate::auth::{CredentialQuery, Credentials};
use crate::dispatch::Dispatcher;
use crate::error::ErrorReply;
use crate::mcp::{ToolCallResult, SERVER_NAME};
use crate::tools::tool_descriptors;
use axum::extract::Query;
use axum::http::request::Parts;
use log::warn;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ErrorCode, Implementation, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct HuntressService {
    dispatcher: Arc<Dispatcher>,
}

impl HuntressService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Run one tool call. Caller mistakes become protocol errors, execution
    /// failures an `isError` result.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<serde_json::Map<String, Value>>,
        credentials: Option<Credentials>,
    ) -> Result<CallToolResult, McpError> {
        let args = arguments.map(Value::Object).unwrap_or(Value::Null);
        match self.dispatcher.dispatch(name, args, credentials).await {
            Ok(result) => Ok(CallToolResult::success(contents(result))),
            Err(e) => match e.reply() {
                ErrorReply::Rpc(code) => {
                    Err(McpError::new(ErrorCode(code as i32), e.to_string(), None))
                }
                ErrorReply::Result(shape) => {
                    warn!("Tool {} failed: {}", name, e);
                    Ok(CallToolResult::error(contents(ToolCallResult::error(&shape))))
                }
            },
        }
    }
}

fn contents(result: ToolCallResult) -> Vec<Content> {
    result
        .content
        .into_iter()
        .map(|block| Content::text(block.text))
        .collect()
}

/// `api_key`/`api_secret` (or camelCase) from the query string of the HTTP
/// request that carried the message.
pub fn request_credentials(parts: &Parts) -> Option<Credentials> {
    Query::<CredentialQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.into_credentials())
}

/// Tool catalogue in rmcp's model types.
pub fn tools() -> serde_json::Result<Vec<Tool>> {
    tool_descriptors()
        .into_iter()
        .map(|d| serde_json::to_value(&d).and_then(serde_json::from_value::<Tool>))
        .collect()
}

impl ServerHandler for HuntressService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_server_info(Implementation::new(SERVER_NAME, env!("CARGO_PKG_VERSION")))
            .with_instructions(
                "Read-only access to the Huntress API: account, organizations, agents and incidents.",
            )
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = tools().map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let credentials = context
            .extensions
            .get::<Parts>()
            .and_then(request_credentials);
        self.call(&request.name, request.arguments, credentials).await
    }
}

/// Streamable HTTP service with per-session state, ready to nest at `/mcp`.
pub fn create_mcp_service(
    dispatcher: Arc<Dispatcher>,
    cancellation_token: CancellationToken,
) -> StreamableHttpService<HuntressService, LocalSessionManager> {
    let service_factory = move || -> Result<HuntressService, std::io::Error> {
        Ok(HuntressService::new(Arc::clone(&dispatcher)))
    };
    let config = StreamableHttpServerConfig::default()
        .with_sse_keep_alive(None)
        .with_sse_retry(None)
        .with_stateful_mode(true)
        .with_cancellation_token(cancellation_token);
    StreamableHttpService::new(
        service_factory,
        LocalSessionManager::default().into(),
        config,
    )
}
