use std::env;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.huntress.io/v1";
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Runtime configuration for the server and its Huntress API client.
/// Values are sourced from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub user_agent: String,
    /// Unset means the HTTP client's default behaviour.
    pub timeout_secs: Option<u64>,
    /// Set selects HTTP mode; unset selects stdio.
    pub port: Option<u16>,
    pub host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: default_user_agent(),
            timeout_secs: None,
            port: None,
            host: DEFAULT_HOST.to_string(),
        }
    }
}

fn default_user_agent() -> String {
    format!("huntress-mcp/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - HUNTRESS_API_URL (default: https://api.huntress.io/v1)
    /// - HUNTRESS_USER_AGENT (default: huntress-mcp/<version>)
    /// - HUNTRESS_HTTP_TIMEOUT_SECS (default: none)
    /// - PORT (HTTP mode when set)
    /// - HOST (default: 0.0.0.0)
    ///
    /// Credentials are not part of this; see [`crate::auth::Credentials`].
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_url = get("HUNTRESS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Url::parse(&api_url).map_err(|e| format!("Invalid HUNTRESS_API_URL {:?}: {}", api_url, e))?;

        let timeout_secs = match get("HUNTRESS_HTTP_TIMEOUT_SECS") {
            Some(s) => Some(
                s.trim()
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid HUNTRESS_HTTP_TIMEOUT_SECS: {}", s))?,
            ),
            None => None,
        };
        let port = match get("PORT") {
            Some(s) => Some(
                s.trim()
                    .parse::<u16>()
                    .map_err(|_| format!("Invalid PORT: {}", s))?,
            ),
            None => None,
        };

        Ok(Self {
            api_url,
            user_agent: get("HUNTRESS_USER_AGENT").unwrap_or_else(default_user_agent),
            timeout_secs,
            port,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
        })
    }
}
