//! Upstream AI service integration
//!
//! Provides the seam between the relay handler and Gemini's `generateContent`
//! API, plus a mock implementation for tests and local harnesses.

pub mod gemini;
pub mod mock;

pub use gemini::{GeminiHttpClient, GenerateContentRequest};
pub use mock::MockGeminiClient;

use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait GenerateContentService: Send + Sync {
    /// Send a `generateContent` request authenticated with `api_key` and
    /// return the provider's JSON body untouched.
    async fn generate_content(&self, api_key: &str, request: &GenerateContentRequest)
        -> Result<Value>;
}
