//! # Application State
//!
//! Core business state for docchat. No terminal or HTTP types here.
//!
//! ```text
//! App
//! ├── backend: Arc<dyn ChatBackend>          // where questions go
//! ├── sessions: SessionStore                 // ordered chats + active id
//! ├── formatter: TextFormatter               // markdown subset → HTML
//! ├── upload_policy: UploadPolicy            // extension/MIME/size limits
//! ├── status_message: String                 // status line text
//! ├── is_loading: bool                       // waiting for the backend
//! ├── pending_upload: Option<UploadCandidate> // accepted file being sent
//! └── upload_error: Option<String>           // last rejection or failure
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use crate::api::ChatBackend;
use crate::core::config::ResolvedConfig;
use crate::core::format::TextFormatter;
use crate::core::session::SessionStore;
use crate::core::validate::{UploadCandidate, UploadPolicy};

pub struct App {
    pub backend: Arc<dyn ChatBackend>,
    pub sessions: SessionStore,
    pub formatter: TextFormatter,
    pub upload_policy: UploadPolicy,
    pub status_message: String,
    pub is_loading: bool,
    pub pending_upload: Option<UploadCandidate>,
    pub upload_error: Option<String>,
}

impl App {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            sessions: SessionStore::new(),
            formatter: TextFormatter::default(),
            upload_policy: UploadPolicy::default(),
            status_message: String::from("Ask a question or /upload a document."),
            is_loading: false,
            pending_upload: None,
            upload_error: None,
        }
    }

    pub fn from_config(backend: Arc<dyn ChatBackend>, config: &ResolvedConfig) -> Self {
        Self {
            formatter: TextFormatter::new(config.formatter.clone()),
            upload_policy: config.upload_policy.clone(),
            ..Self::new(backend)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_app;

    #[test]
    fn test_app_new_defaults() {
        let app = test_app();
        assert!(!app.is_loading);
        assert_eq!(app.sessions.len(), 1);
        assert!(app.pending_upload.is_none());
        assert!(app.upload_error.is_none());
        assert!(app.formatter.config().escape_html);
    }
}
