use std::marker::PhantomData;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::error::AiError;
use crate::traits::{OutputBuilder, PromptBuilder};
use crate::util::strip_code_blocks;

use super::schema::StructuredOutput;
use super::types::{ChatRequest, WireMessage};
use super::OpenAi;

pub struct OpenAiPromptBuilder {
    agent: OpenAi,
    input: String,
    preamble: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl OpenAiPromptBuilder {
    pub(crate) fn new(agent: OpenAi, input: String) -> Self {
        Self {
            agent,
            input,
            preamble: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Switch to a typed, schema-validated response.
    pub fn output<T: StructuredOutput + Send + 'static>(self) -> OpenAiOutputBuilder<T> {
        OpenAiOutputBuilder {
            builder: self,
            _phantom: PhantomData,
        }
    }

    fn request(&self) -> ChatRequest {
        let mut messages = Vec::new();

        if let Some(ref preamble) = self.preamble {
            messages.push(WireMessage::system(preamble));
        }

        if !self.input.is_empty() {
            messages.push(WireMessage::user(&self.input));
        }

        let mut request = ChatRequest::new(self.agent.model()).messages(messages);
        if let Some(temperature) = self.temperature {
            request = request.temperature(temperature);
        }
        if let Some(limit) = self.max_tokens {
            request = request.token_limit(limit);
        }
        request
    }
}

#[async_trait]
impl PromptBuilder for OpenAiPromptBuilder {
    fn preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    async fn send(self) -> Result<String> {
        let request = self.request();
        self.agent.client().chat(&request).await
    }
}

// =============================================================================
// Structured Output Builder
// =============================================================================

pub struct OpenAiOutputBuilder<T> {
    builder: OpenAiPromptBuilder,
    _phantom: PhantomData<T>,
}

#[async_trait]
impl<T: StructuredOutput + Send + 'static> OutputBuilder<T> for OpenAiOutputBuilder<T> {
    async fn send(self) -> Result<T> {
        debug!(type_name = T::type_name(), "OpenAI structured output extraction");

        let request = self
            .builder
            .request()
            .json_schema("structured_response", T::openai_schema());

        let json = self.builder.agent.client().chat(&request).await?;

        serde_json::from_str(strip_code_blocks(&json))
            .map_err(|e| AiError::Parse(format!("structured response: {e}")).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
    struct Verdict {
        label: String,
    }

    #[test]
    fn preamble_becomes_leading_system_message() {
        let request = OpenAi::new("sk-test", "gpt-4o")
            .prompt("Describe the brand.")
            .preamble("You are a brand strategist.")
            .temperature(0.7)
            .max_tokens(500)
            .request();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "You are a brand strategist.");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 500);
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn structured_output_attaches_strict_schema() {
        let builder = OpenAi::new("sk-test", "gpt-4o").prompt("x").output::<Verdict>();
        let request = builder
            .builder
            .request()
            .json_schema("structured_response", Verdict::openai_schema());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["response_format"]["type"], "json_schema");
        assert_eq!(json["response_format"]["json_schema"]["strict"], true);
        assert_eq!(
            json["response_format"]["json_schema"]["schema"]["additionalProperties"],
            false
        );
    }
}
