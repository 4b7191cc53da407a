use super::types::GenerateContentRequest;
use crate::ai::GenerateContentService;
use crate::models::DEFAULT_BASE_URL;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Lightweight Gemini REST client.
///
/// Holds no credential; the key is supplied per call and sent as the `key`
/// query parameter.
pub struct GeminiHttpClient {
    client: Client,
    model: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl GeminiHttpClient {
    /// Construct a Gemini client.
    ///
    /// `model` should be the bare model ID (for example
    /// `gemini-2.5-flash-preview-05-20`); a `models/` prefix is stripped.
    pub fn new(model: String) -> Self {
        Self::new_with_client(model, Client::new())
    }

    pub fn new_with_client(model: String, client: Client) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// `None` leaves the request unbounded.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl GenerateContentService for GeminiHttpClient {
    async fn generate_content(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<Value> {
        tracing::debug!("Sending generateContent request to Gemini ({})", self.model);

        let mut builder = self
            .client
            .post(self.generate_content_url())
            .query(&[("key", api_key)])
            .header(CONTENT_TYPE, "application/json")
            .json(request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            let e = e.without_url();
            tracing::error!("Failed to send request to Gemini: {}", e);
            e
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            return Err(Error::Upstream {
                status: status.as_u16(),
                detail: error_text,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            Error::Serialization(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::types::{Content, GenerationConfig, Part};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_MODEL: &str = "gemini-2.5-flash-preview-05-20";

    fn make_client(server: &MockServer, model: &str) -> GeminiHttpClient {
        GeminiHttpClient::new(model.to_string()).with_base_url(server.uri())
    }

    fn sample_request() -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![Part::text("describe"), Part::jpeg("AAA")],
            }],
            generation_config: GenerationConfig::json_output(),
        }
    }

    #[tokio::test]
    async fn test_generate_content_sends_key_as_query_param() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{}:generateContent", TEST_MODEL)))
            .and(query_param("key", "test-key"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "contents": [{
                    "parts": [
                        { "text": "describe" },
                        { "inlineData": { "mimeType": "image/jpeg", "data": "AAA" } }
                    ]
                }],
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "x": 1 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, TEST_MODEL);
        let body = client
            .generate_content("test-key", &sample_request())
            .await
            .unwrap();

        assert_eq!(body, json!({ "x": 1 }));
    }

    #[tokio::test]
    async fn test_api_error_returns_upstream_error_with_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model overloaded"))
            .mount(&server)
            .await;

        let client = make_client(&server, TEST_MODEL);
        let err = client
            .generate_content("test-key", &sample_request())
            .await
            .unwrap_err();

        match err {
            Error::Upstream { status, detail } => {
                assert_eq!(status, 503);
                assert_eq!(detail, "model overloaded");
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_serialization_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = make_client(&server, TEST_MODEL);
        let err = client
            .generate_content("test-key", &sample_request())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn test_strips_models_prefix_from_model_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "models/gemini-2.0-flash");
        assert_eq!(client.model(), "gemini-2.0-flash");

        client
            .generate_content("test-key", &sample_request())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_key() {
        // Nothing listens on port 1.
        let client = GeminiHttpClient::new(TEST_MODEL.to_string())
            .with_base_url("http://127.0.0.1:1".to_string());

        let err = client
            .generate_content("super-secret-key", &sample_request())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Http(_)));
        assert!(!err.to_string().contains("super-secret-key"));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = GeminiHttpClient::new(TEST_MODEL.to_string())
            .with_base_url("http://localhost:9000/".to_string());
        assert_eq!(
            client.generate_content_url(),
            format!("http://localhost:9000/v1beta/models/{}:generateContent", TEST_MODEL)
        );
    }
}
