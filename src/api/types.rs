//! Request and response bodies of the backend's JSON endpoints.

use serde::{Deserialize, Serialize};

/// Body of `POST /query`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct QueryBody<'a> {
    pub query: &'a str,
}

/// Body of `POST /chat`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatBody<'a> {
    pub message: &'a str,
    pub session_id: &'a str,
}

/// Answer from `/query` and `/chat`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AnswerBody {
    #[serde(alias = "answer")]
    pub response: String,
}

/// Reply from `/upload`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct UploadReply {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Error body some backends send alongside a failure status.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    #[serde(alias = "error")]
    pub detail: String,
}
