//! # Backend API
//!
//! The document Q&A backend is an opaque HTTP service. `ChatBackend` is the
//! seam the rest of the crate talks to; `HttpBackend` is the real client.

pub mod backend;
pub mod http;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

pub use backend::{BackendError, ChatBackend, ChatRequest, UploadFile};
pub use http::HttpBackend;

use crate::core::config::ResolvedConfig;

/// Build the backend from a resolved config.
pub fn build_backend(config: &ResolvedConfig) -> Result<Arc<dyn ChatBackend>, BackendError> {
    let backend = HttpBackend::new(
        &config.backend_url,
        config.backend_mode,
        Duration::from_secs(config.timeout_secs),
    )?;
    Ok(Arc::new(backend))
}
