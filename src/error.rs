//! Error types
//!
//! Nothing here ever reaches the host page as a thrown fault: remote errors
//! are swallowed by the engine (fail-open), config errors surface only from
//! the constructor.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failure of the external grammar/rewrite collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("transport failure: {0}")]
    Transport(String),
    /// Extension/host context went away (reload, permission loss)
    #[error("host context invalidated")]
    ContextInvalidated,
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Classify a rejection message coming from the host transport
    pub fn from_message(message: &str) -> Self {
        if message.to_ascii_lowercase().contains("context invalidated") {
            RemoteError::ContextInvalidated
        } else {
            RemoteError::Transport(message.to_string())
        }
    }
}

/// Invalid engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    ZeroThreshold { field: &'static str },
    #[error("at least one rewrite mode is required")]
    NoRewriteModes,
    #[error("Invalid config: {0}")]
    Parse(String),
}

impl From<ConfigError> for JsValue {
    fn from(e: ConfigError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
