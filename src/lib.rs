pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod mcp;
pub mod rate;
pub mod server;
pub mod service;
pub mod tools;
pub mod web;

pub use auth::Credentials;
pub use config::Config;
pub use dispatch::Dispatcher;
pub use error::ToolError;
