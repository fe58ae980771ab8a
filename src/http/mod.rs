use crate::auth::Credentials;
use crate::config::Config;
use crate::error::ToolError;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Thin GET-only client for the Huntress REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(cfg: &Config) -> reqwest::Result<Self> {
        let mut default_headers = HeaderMap::new();
        if let Ok(ua) = HeaderValue::from_str(&cfg.user_agent) {
            default_headers.insert(USER_AGENT, ua);
        }
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        // Authorization is set per request: HTTP mode may carry different credentials on each call.
        let mut builder = Client::builder()
            .default_headers(default_headers)
            .use_rustls_tls();
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            base_url: cfg.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `<base_url><endpoint>` and return the JSON body verbatim.
    pub async fn get_json(
        &self,
        creds: &Credentials,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ToolError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {} query={:?}", url, query);
        let res = self
            .client
            .get(&url)
            .header(AUTHORIZATION, creds.basic_auth())
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!("GET {} failed: {}", url, e);
                ToolError::Upstream {
                    status: None,
                    code: "network_error".into(),
                    message: e.to_string(),
                }
            })?;

        let status = res.status();
        let text = res.text().await.map_err(|e| ToolError::Upstream {
            status: Some(status.as_u16()),
            code: "network_error".into(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            warn!("GET {} returned {}", url, status);
            return Err(map_status_to_error(status, &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ToolError::Upstream {
            status: Some(status.as_u16()),
            code: "server_error".into(),
            message: format!("invalid JSON in response: {}", e),
        })
    }
}

/// Classify a non-2xx status; prefer the error body's own message.
pub fn map_status_to_error(status: StatusCode, body: &str) -> ToolError {
    let code = match status {
        StatusCode::BAD_REQUEST => "bad_request",
        StatusCode::UNAUTHORIZED => "unauthorized",
        StatusCode::FORBIDDEN => "forbidden",
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::TOO_MANY_REQUESTS => "rate_limited",
        s if s.is_server_error() => "upstream_error",
        _ => "server_error",
    };
    let message = upstream_message(body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, trimmed)
        }
    });
    ToolError::Upstream {
        status: Some(status.as_u16()),
        code: code.to_string(),
        message,
    }
}

fn upstream_message(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|k| v.get(*k).and_then(|m| m.as_str()))
        .map(str::to_string)
}

/// Percent-encode one path segment (ids from tool arguments).
pub fn encode_path_segment(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}
