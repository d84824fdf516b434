//! docchat library exports for testing

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub mod api;
pub mod core;
pub mod repl;

#[cfg(test)]
pub mod test_support;

/// Which backend endpoint carries a user's question.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Stateless `POST /query` with `{"query": ...}`.
    #[default]
    Query,
    /// Session-aware `POST /chat` with `{"message": ..., "session_id": ...}`.
    Chat,
}

impl BackendMode {
    /// Endpoint path, relative to the backend base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            BackendMode::Query => "query",
            BackendMode::Chat => "chat",
        }
    }
}
