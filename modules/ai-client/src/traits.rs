use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// PromptBuilder Trait
// =============================================================================

/// Single-shot completion request. One `send` is one HTTP call, no retries.
#[async_trait]
pub trait PromptBuilder: Send + Sized {
    fn preamble(self, preamble: impl Into<String>) -> Self;
    fn temperature(self, temperature: f32) -> Self;
    fn max_tokens(self, max_tokens: u32) -> Self;
    async fn send(self) -> Result<String>;
}

// =============================================================================
// OutputBuilder Trait
// =============================================================================

#[async_trait]
pub trait OutputBuilder<T>: Send {
    async fn send(self) -> Result<T>;
}
