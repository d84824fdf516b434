use std::fmt;

use async_trait::async_trait;

/// Errors that can occur while talking to the backend.
#[derive(Debug)]
pub enum BackendError {
    /// Client misconfigured (bad base URL, unusable TLS setup). Not retryable.
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused). Retryable.
    Network(String),
    /// Backend returned a non-success status. Retryable if status >= 500.
    Api { status: u16, message: String },
    /// Backend answered with a body we could not read.
    Parse(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Config(msg) => write!(f, "config error: {msg}"),
            BackendError::Network(msg) => write!(f, "network error: {msg}"),
            BackendError::Api { status, message } => {
                write!(f, "backend error (HTTP {status}): {message}")
            }
            BackendError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// A question for the backend.
pub struct ChatRequest<'a> {
    /// Local session the question belongs to. Sent to `/chat`, ignored by `/query`.
    pub session_id: &'a str,
    pub text: &'a str,
}

/// A document ready to be sent to `/upload`.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    /// Empty when unknown; the backend then sniffs it itself.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Returns the name of the backend, for logs and the status line.
    fn name(&self) -> &str;

    /// Sends a question and returns the answer text (markdown subset).
    async fn send(&self, request: ChatRequest<'_>) -> Result<String, BackendError>;

    /// Uploads a document and returns the backend's confirmation message.
    async fn upload(&self, file: UploadFile) -> Result<String, BackendError>;
}
