//! Text gateway trait definition.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Options for a completion request.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Temperature for sampling; moderate values favor coherent but varied
    /// output.
    pub temperature: f32,
    /// Top-k truncation of the output distribution.
    pub top_k: u32,
    /// Nucleus (top-p) truncation of the output distribution.
    pub top_p: f32,
    /// Cap on generated tokens, bounding latency and cost.
    pub max_output_tokens: u32,
    /// Request deadline; expiry surfaces as `GatewayError::Timeout`.
    pub timeout: Duration,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Errors that can occur when calling the gateway.
///
/// Failure is always a value of this type, never text masquerading as a
/// completion: callers must match on the `Result`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

/// Trait for generative-language text-completion services.
#[async_trait]
pub trait TextGateway: Send + Sync {
    /// Get the gateway's name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Complete a single text prompt. One attempt, no retry.
    async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GatewayError>;
}
