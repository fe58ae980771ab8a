use base64::Engine;
use serde::Deserialize;
use std::env;
use std::fmt;

pub const API_KEY_VAR: &str = "HUNTRESS_API_KEY";
pub const API_SECRET_VAR: &str = "HUNTRESS_API_SECRET";

/// Huntress API key pair. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Builds a pair only when both halves are non-blank.
    pub fn new(api_key: Option<String>, api_secret: Option<String>) -> Option<Self> {
        let api_key = api_key.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())?;
        let api_secret = api_secret
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())?;
        Some(Self {
            api_key,
            api_secret,
        })
    }

    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(lookup(API_KEY_VAR), lookup(API_SECRET_VAR))
    }

    /// Value for the `Authorization` header.
    pub fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.api_key, self.api_secret);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw)
        )
    }
}

/// Credentials supplied on an HTTP request's query string.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialQuery {
    #[serde(alias = "apiKey")]
    pub api_key: Option<String>,
    #[serde(alias = "apiSecret")]
    pub api_secret: Option<String>,
}

impl CredentialQuery {
    pub fn into_credentials(self) -> Option<Credentials> {
        Credentials::new(self.api_key, self.api_secret)
    }
}

/// Lazily resolved process credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CredentialSlot {
    #[default]
    Unresolved,
    Ready(Credentials),
}

impl CredentialSlot {
    /// Returns cached credentials, consulting `resolve` only while unresolved.
    pub fn get_or_resolve<F>(&mut self, resolve: F) -> Option<Credentials>
    where
        F: FnOnce() -> Option<Credentials>,
    {
        if let CredentialSlot::Unresolved = self {
            if let Some(creds) = resolve() {
                *self = CredentialSlot::Ready(creds);
            }
        }
        match self {
            CredentialSlot::Ready(creds) => Some(creds.clone()),
            CredentialSlot::Unresolved => None,
        }
    }
}
