use crate::auth::{CredentialSlot, Credentials};
use crate::config::Config;
use crate::error::ToolError;
use crate::http::ApiClient;
use crate::mcp::ToolCallResult;
use crate::rate::RateGate;
use crate::tools::{plan_call, ToolCall};
use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Source consulted the first time process credentials are needed.
pub type CredentialResolver = Arc<dyn Fn() -> Option<Credentials> + Send + Sync>;

/// Routes tool calls to the Huntress API.
///
/// Owns the rate gate and the lazily resolved process credentials; one
/// instance is shared by every connection of a transport.
pub struct Dispatcher {
    client: ApiClient,
    gate: RateGate,
    slot: Mutex<CredentialSlot>,
    resolver: CredentialResolver,
}

impl Dispatcher {
    /// Dispatcher reading credentials from the environment on first use.
    pub fn new(cfg: &Config) -> reqwest::Result<Self> {
        Ok(Self::with_parts(
            ApiClient::new(cfg)?,
            RateGate::default(),
            Arc::new(Credentials::from_env),
        ))
    }

    pub fn with_parts(client: ApiClient, gate: RateGate, resolver: CredentialResolver) -> Self {
        Self {
            client,
            gate,
            slot: Mutex::new(CredentialSlot::Unresolved),
            resolver,
        }
    }

    /// Request-scoped credentials win; otherwise the cached process ones.
    /// Request credentials never replace the cached slot.
    pub async fn credentials(&self, request: Option<Credentials>) -> Option<Credentials> {
        if request.is_some() {
            return request;
        }
        let mut slot = self.slot.lock().await;
        let was_unresolved = *slot == CredentialSlot::Unresolved;
        let creds = slot.get_or_resolve(|| (self.resolver)());
        if was_unresolved && creds.is_some() {
            info!("Huntress API credentials resolved");
        }
        creds
    }

    pub async fn has_credentials(&self, request: Option<Credentials>) -> bool {
        self.credentials(request).await.is_some()
    }

    pub async fn dispatch(
        &self,
        name: &str,
        args: Value,
        request: Option<Credentials>,
    ) -> Result<ToolCallResult, ToolError> {
        debug!("tools/call name={}", name);
        match plan_call(name, args)? {
            ToolCall::HealthCheck => Ok(ToolCallResult::text(self.health_text(request).await)),
            ToolCall::Upstream { endpoint, query } => {
                let creds = self
                    .credentials(request)
                    .await
                    .ok_or(ToolError::AuthRequired)?;
                self.gate.admit().await;
                let value = self.client.get_json(&creds, &endpoint, &query).await?;
                ToolCallResult::json(&value)
            }
        }
    }

    async fn health_text(&self, request: Option<Credentials>) -> String {
        let credentials = if self.has_credentials(request).await {
            "configured"
        } else {
            "not configured (set HUNTRESS_API_KEY and HUNTRESS_API_SECRET)"
        };
        format!(
            "Huntress MCP server {} is running.\nAPI base URL: {}\nCredentials: {}",
            env!("CARGO_PKG_VERSION"),
            self.client.base_url(),
            credentials
        )
    }
}
