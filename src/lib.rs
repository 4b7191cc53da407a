//! Relay for image-analysis requests to Gemini
//!
//! Accepts a browser client's prompt and base64 images, attaches the
//! server-held API key and forwards the request to Gemini's `generateContent`
//! endpoint, returning the provider's JSON or a normalized error envelope.

pub mod ai;
pub mod error;
pub mod models;
pub mod prompts;
pub mod relay;
pub mod server;

pub use error::{Error, Result};
