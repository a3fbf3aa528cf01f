//! LLM client module for generating project file content.
//!
//! This module provides a trait-based abstraction over text-generation
//! providers, with Gemini as the primary implementation.

mod error;
mod gemini;

pub use error::{classify_http_status, LlmError, LlmErrorKind};
pub use gemini::GeminiClient;

use async_trait::async_trait;

/// Trait for text-generation clients.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for a single user prompt.
    ///
    /// Transport and provider errors are returned as-is; callers treat them as
    /// fatal for the whole task.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifier, for logs.
    fn model(&self) -> &str;
}
