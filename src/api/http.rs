//! HTTP backend: JSON questions to `/query` or `/chat`, multipart uploads to `/upload`.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};

use super::backend::{BackendError, ChatBackend, ChatRequest, UploadFile};
use super::types::{AnswerBody, ChatBody, ErrorBody, QueryBody, UploadReply};
use crate::BackendMode;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub struct HttpBackend {
    base_url: String,
    mode: BackendMode,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, mode: BackendMode, timeout: Duration) -> Result<Self, BackendError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(BackendError::Config(format!(
                "backend URL must start with http:// or https://, got {base_url:?}"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;

        Ok(Self {
            base_url,
            mode,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }
}

/// Turns a non-success response into `BackendError::Api`, preferring the
/// backend's own `detail`/`error` message over the raw body.
async fn api_error(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.detail)
        .unwrap_or(body);
    warn!("Backend error: {} - {}", status, message);
    BackendError::Api { status, message }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    fn name(&self) -> &str {
        self.mode.endpoint()
    }

    async fn send(&self, request: ChatRequest<'_>) -> Result<String, BackendError> {
        let url = self.url(self.mode.endpoint());
        info!(
            "Backend request: POST {} (session={}, {} bytes)",
            url,
            request.session_id,
            request.text.len()
        );

        let builder = self.client.post(&url);
        let builder = match self.mode {
            BackendMode::Query => builder.json(&QueryBody {
                query: request.text,
            }),
            BackendMode::Chat => builder.json(&ChatBody {
                message: request.text,
                session_id: request.session_id,
            }),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        debug!("Backend response status: {}", response.status());
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        let answer: AnswerBody =
            serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))?;

        info!("Backend answered with {} bytes", answer.response.len());
        Ok(answer.response)
    }

    async fn upload(&self, file: UploadFile) -> Result<String, BackendError> {
        let url = self.url("upload");
        info!(
            "Uploading {} ({} bytes, mime={:?}) to {}",
            file.file_name,
            file.bytes.len(),
            file.mime_type,
            url
        );

        let file_name = file.file_name.clone();
        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if !file.mime_type.is_empty() {
            part = part
                .mime_str(&file.mime_type)
                .map_err(|e| BackendError::Config(e.to_string()))?;
        }
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        debug!("Upload response status: {}", response.status());
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        let reply: UploadReply =
            serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))?;

        let message = if reply.message.is_empty() {
            format!("{} uploaded", reply.filename.unwrap_or(file_name))
        } else {
            reply.message
        };
        info!("Upload finished: {}", message);
        Ok(message)
    }
}
