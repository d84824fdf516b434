//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{BackendError, ChatBackend, ChatRequest, UploadFile};

/// A backend for tests that don't need real HTTP calls. Echoes questions back.
pub struct NoopBackend;

#[async_trait]
impl ChatBackend for NoopBackend {
    fn name(&self) -> &str {
        "noop"
    }

    async fn send(&self, request: ChatRequest<'_>) -> Result<String, BackendError> {
        Ok(format!("echo: {}", request.text))
    }

    async fn upload(&self, file: UploadFile) -> Result<String, BackendError> {
        Ok(format!("{} received", file.file_name))
    }
}

/// Creates a test App with a NoopBackend.
pub fn test_app() -> crate::core::state::App {
    crate::core::state::App::new(Arc::new(NoopBackend))
}
