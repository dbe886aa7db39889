//! Generative-language gateway abstraction.
//!
//! A trait-based seam around the single outbound text-completion call, so
//! the recommender can be exercised against scripted fakes in tests.

mod gemini;
mod provider;

pub use gemini::{GeminiGateway, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use provider::{GatewayError, GenerationOptions, TextGateway};
