use serde::Serialize;
use thiserror::Error;

/// Failure of a single tool invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("Huntress API credentials are not configured; set HUNTRESS_API_KEY and HUNTRESS_API_SECRET")]
    AuthRequired,
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("Huntress API error: {message}")]
    Upstream {
        status: Option<u16>,
        code: String,
        message: String,
    },
}

// JSON-RPC error codes used by the MCP layer.
pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Error body embedded in `isError` tool results.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ErrorShape {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// How a failed tool call travels back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorReply {
    /// Caller mistake, reported as a JSON-RPC error with this code.
    Rpc(i64),
    /// Execution failure, returned as an `isError` tool result.
    Result(ErrorShape),
}

impl ToolError {
    pub fn reply(&self) -> ErrorReply {
        match self {
            ToolError::UnknownTool(_) => ErrorReply::Rpc(METHOD_NOT_FOUND),
            ToolError::MissingParameter(_) | ToolError::InvalidParams(_) => {
                ErrorReply::Rpc(INVALID_PARAMS)
            }
            ToolError::AuthRequired => ErrorReply::Result(ErrorShape {
                code: "auth_required".into(),
                message: self.to_string(),
                status: None,
            }),
            ToolError::Upstream {
                status,
                code,
                message,
            } => ErrorReply::Result(ErrorShape {
                code: code.clone(),
                message: message.clone(),
                status: *status,
            }),
        }
    }
}
