//! The analysis relay handler.
//!
//! Accepts the browser client's request, attaches the server-held Gemini key
//! and forwards the assembled payload upstream. Each invocation is
//! independent; nothing is retained between calls.

use crate::ai::gemini::{Content, GenerationConfig, Part};
use crate::ai::{GeminiHttpClient, GenerateContentRequest, GenerateContentService};
use crate::models::{AnalyzeRequest, Config};
use crate::prompts;
use axum::body::{Body, Bytes};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info, warn};

/// Client-visible failure categories.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Server API key is not configured.")]
    ConfigMissing,

    /// `detail` is logged, never returned to the client.
    #[error("Error while communicating with the Gemini API.")]
    Upstream { status: StatusCode, detail: String },

    #[error("{0}")]
    MalformedInput(String),

    #[error("Failed to read request body: {0}")]
    UnreadableBody(String),

    #[error("{0}")]
    Unexpected(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::Upstream { status, .. } => *status,
            // Malformed input keeps the 500 existing clients already handle.
            RelayError::ConfigMissing
            | RelayError::MalformedInput(_)
            | RelayError::UnreadableBody(_)
            | RelayError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<crate::Error> for RelayError {
    fn from(err: crate::Error) -> Self {
        match err {
            crate::Error::Upstream { status, detail } => RelayError::Upstream {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                detail,
            },
            other => RelayError::Unexpected(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelayBody {
    Json(Value),
    Text(String),
}

/// What the handler answers with; converts into an axum [`Response`].
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub body: RelayBody,
}

impl RelayResponse {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: RelayBody::Json(body),
        }
    }

    /// The `error` field of a JSON error envelope, if there is one.
    #[cfg(test)]
    pub(crate) fn error_message(&self) -> Option<&str> {
        match &self.body {
            RelayBody::Json(body) => body.get("error").and_then(Value::as_str),
            RelayBody::Text(_) => None,
        }
    }
}

impl From<RelayError> for RelayResponse {
    fn from(err: RelayError) -> Self {
        let status = err.status();
        match err {
            RelayError::MethodNotAllowed => Self {
                status,
                body: RelayBody::Text(err.to_string()),
            },
            other => Self::json(status, json!({ "error": other.to_string() })),
        }
    }
}

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        match self.body {
            RelayBody::Json(body) => (self.status, Json(body)).into_response(),
            RelayBody::Text(text) => (self.status, text).into_response(),
        }
    }
}

/// Assemble the Gemini payload for one analysis request.
///
/// Parts are ordered prompt, front image, then (only when a back image was
/// sent) the other-face note followed by the back image.
pub fn build_payload(request: &AnalyzeRequest) -> GenerateContentRequest {
    let mut parts = vec![
        Part::text(request.prompt.as_deref().unwrap_or_default()),
        Part::jpeg(request.base64_image_data_front.as_str()),
    ];

    if let Some(back) = request.back_image() {
        parts.push(Part::text(prompts::BACK_FACE_NOTE));
        parts.push(Part::jpeg(back));
    }

    GenerateContentRequest {
        contents: vec![Content { role: None, parts }],
        generation_config: GenerationConfig::json_output(),
    }
}

async fn read_body(method: &Method, body: Body, limit: usize) -> Result<Bytes, RelayError> {
    if *method != Method::POST {
        return Err(RelayError::MethodNotAllowed);
    }
    axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| RelayError::UnreadableBody(e.to_string()))
}

pub struct Relay {
    upstream: Box<dyn GenerateContentService>,
    api_key: Option<String>,
}

impl Relay {
    pub fn new(upstream: Box<dyn GenerateContentService>, api_key: Option<String>) -> Self {
        Self { upstream, api_key }
    }

    /// Build a relay talking to the real Gemini endpoint described by `config`.
    pub fn from_config(config: &Config) -> Self {
        let client = GeminiHttpClient::new(config.gemini_model.clone())
            .with_base_url(config.gemini_base_url.clone())
            .with_timeout(config.upstream_timeout);

        info!(
            "Relaying to {} (model: {})",
            config.gemini_base_url,
            client.model()
        );
        if config.gemini_api_key.is_none() {
            warn!("GEMINI_API_KEY is not set; analysis requests will fail until it is");
        }

        Self::new(Box::new(client), config.gemini_api_key.clone())
    }

    pub async fn handle(&self, method: &Method, body: &[u8]) -> RelayResponse {
        let result = self.try_handle(method, body).await;
        Self::respond(method, result)
    }

    /// Like [`Relay::handle`], but reads at most `limit` bytes of a streamed
    /// body, and only after the method gate has passed.
    pub async fn handle_body(&self, method: &Method, body: Body, limit: usize) -> RelayResponse {
        let result = match read_body(method, body, limit).await {
            Ok(bytes) => self.try_handle(method, &bytes).await,
            Err(err) => Err(err),
        };
        Self::respond(method, result)
    }

    fn respond(method: &Method, result: Result<Value, RelayError>) -> RelayResponse {
        match result {
            Ok(result) => RelayResponse::json(StatusCode::OK, result),
            Err(err) => {
                match &err {
                    RelayError::MethodNotAllowed => {
                        warn!("Rejected {} request", method);
                    }
                    RelayError::ConfigMissing => {
                        error!("The GEMINI_API_KEY environment variable is not set");
                    }
                    // The Gemini client already logged the upstream body.
                    RelayError::Upstream { .. } => {}
                    RelayError::MalformedInput(detail) => {
                        warn!("Malformed request body: {}", detail);
                    }
                    RelayError::UnreadableBody(detail) => {
                        warn!("Could not read request body: {}", detail);
                    }
                    RelayError::Unexpected(detail) => {
                        error!("Relay failed: {}", detail);
                    }
                }
                err.into()
            }
        }
    }

    async fn try_handle(&self, method: &Method, body: &[u8]) -> Result<Value, RelayError> {
        if *method != Method::POST {
            return Err(RelayError::MethodNotAllowed);
        }

        let request: AnalyzeRequest = serde_json::from_slice(body)
            .map_err(|e| RelayError::MalformedInput(e.to_string()))?;

        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(RelayError::ConfigMissing)?;

        let payload = build_payload(&request);
        tracing::debug!(
            "Forwarding {} part(s) to Gemini",
            payload.contents.iter().map(|c| c.parts.len()).sum::<usize>()
        );

        Ok(self.upstream.generate_content(api_key, &payload).await?)
    }
}
