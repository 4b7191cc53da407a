use super::{GenerateContentRequest, GenerateContentService};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

enum MockReply {
    Body(Value),
    UpstreamError { status: u16, detail: String },
}

/// In-memory stand-in for Gemini that records what it was asked.
///
/// Clones share replies and recorded calls.
#[derive(Clone)]
pub struct MockGeminiClient {
    replies: Arc<Mutex<Vec<MockReply>>>,
    requests: Arc<Mutex<Vec<GenerateContentRequest>>>,
    api_keys: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockGeminiClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            api_keys: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_response(self, body: Value) -> Self {
        self.replies.lock().unwrap().push(MockReply::Body(body));
        self
    }

    pub fn with_upstream_error(self, status: u16, detail: &str) -> Self {
        self.replies.lock().unwrap().push(MockReply::UpstreamError {
            status,
            detail: detail.to_string(),
        });
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn last_request(&self) -> Option<GenerateContentRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn last_api_key(&self) -> Option<String> {
        self.api_keys.lock().unwrap().last().cloned()
    }
}

impl Default for MockGeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerateContentService for MockGeminiClient {
    async fn generate_content(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<Value> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        self.requests.lock().unwrap().push(request.clone());
        self.api_keys.lock().unwrap().push(api_key.to_string());

        let replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            // Default mock response
            return Ok(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "{}" }] }
                }]
            }));
        }

        let index = (*count - 1) % replies.len();
        match &replies[index] {
            MockReply::Body(body) => Ok(body.clone()),
            MockReply::UpstreamError { status, detail } => Err(Error::Upstream {
                status: *status,
                detail: detail.clone(),
            }),
        }
    }
}
