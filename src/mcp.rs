use crate::auth::Credentials;
use crate::dispatch::Dispatcher;
use crate::error::{
    ErrorReply, ErrorShape, ToolError, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR,
};
use crate::tools::{tool_descriptors, PROTOCOL_VERSION};
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

pub const SERVER_NAME: &str = "huntress-mcp";

// Minimal JSON-RPC 2.0 types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Str(String),
    Num(i64),
    Null,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    /// Absent for notifications; an explicit `null` is still a request.
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<Id>,
}

fn present_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Id>, D::Error> {
    Id::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Id,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

pub fn rpc_error(id: Option<Id>, code: i64, message: &str) -> Response {
    Response {
        jsonrpc: "2.0".into(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.into(),
            data: None,
        }),
        id: id.unwrap_or(Id::Null),
    }
}

pub fn rpc_ok(id: Option<Id>, result: Value) -> Response {
    Response {
        jsonrpc: "2.0".into(),
        result: Some(result),
        error: None,
        id: id.unwrap_or(Id::Null),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

/// Uniform `tools/call` result: one text block, `isError` only when set.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolCallResult {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock {
                kind: "text".into(),
                text: text.into(),
            }],
            is_error: false,
        }
    }

    pub fn json(value: &Value) -> Result<Self, ToolError> {
        let text = serde_json::to_string_pretty(value).map_err(|e| ToolError::Upstream {
            status: None,
            code: "server_error".into(),
            message: e.to_string(),
        })?;
        Ok(Self::text(text))
    }

    pub fn error(shape: &ErrorShape) -> Self {
        let body = json!({ "error": shape });
        let text = serde_json::to_string_pretty(&body).unwrap_or_else(|_| shape.message.clone());
        Self {
            is_error: true,
            ..Self::text(text)
        }
    }
}

#[derive(Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Static server description returned by `initialize` and HTTP discovery.
pub fn server_info() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        }
    })
}

/// Handle one raw JSON-RPC message. `None` means no reply (notification).
pub async fn handle_message(
    dispatcher: &Dispatcher,
    raw: &str,
    credentials: Option<Credentials>,
) -> Option<Response> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("Discarding malformed message: {}", e);
            return Some(rpc_error(None, PARSE_ERROR, &format!("Parse error: {}", e)));
        }
    };
    let req: Request = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => {
            return Some(rpc_error(
                None,
                INVALID_REQUEST,
                &format!("Invalid request: {}", e),
            ))
        }
    };
    if req.id.is_none() {
        debug!("Notification method={}", req.method);
        return None;
    }
    Some(handle_request(dispatcher, req, credentials).await)
}

pub async fn handle_request(
    dispatcher: &Dispatcher,
    req: Request,
    credentials: Option<Credentials>,
) -> Response {
    debug!("Received method={}", req.method);
    match req.method.as_str() {
        "initialize" => rpc_ok(req.id, server_info()),
        "ping" => rpc_ok(req.id, json!({})),
        "tools/list" => rpc_ok(req.id, json!({ "tools": tool_descriptors() })),
        "tools/call" => handle_tools_call(dispatcher, req.id, req.params, credentials).await,
        other => rpc_error(req.id, METHOD_NOT_FOUND, &format!("Method not found: {}", other)),
    }
}

async fn handle_tools_call(
    dispatcher: &Dispatcher,
    id: Option<Id>,
    params: Value,
    credentials: Option<Credentials>,
) -> Response {
    let Ok(call) = serde_json::from_value::<ToolCallParams>(params) else {
        return rpc_error(id, INVALID_PARAMS, "Invalid params");
    };
    let result = match dispatcher.dispatch(&call.name, call.arguments, credentials).await {
        Ok(r) => r,
        Err(e) => match e.reply() {
            ErrorReply::Rpc(code) => return rpc_error(id, code, &e.to_string()),
            ErrorReply::Result(shape) => {
                warn!("Tool {} failed: {}", call.name, e);
                ToolCallResult::error(&shape)
            }
        },
    };
    match serde_json::to_value(result) {
        Ok(v) => rpc_ok(id, v),
        Err(e) => rpc_error(id, INTERNAL_ERROR, &format!("Internal error: {}", e)),
    }
}
