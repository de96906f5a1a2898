use digest_datastore::SummaryRecord;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    llm::summarizer::{build_prompt, parse_summary_response, SummarizeError},
    Summarizer,
};

pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;

/// Client for the Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_output_tokens: u32,
}

impl AnthropicClient {
    const API_VERSION: &'static str = "2023-06-01";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com".into(),
            model: Self::SUMMARIZER_MODEL.into(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    fn message_request_body(&self, prompt: String) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_output_tokens,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        })
    }

    pub async fn send_message_request(
        &self,
        prompt: String,
    ) -> Result<MessagesResponse, SummarizeError> {
        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .json(&self.message_request_body(prompt))
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(SummarizeError::Api { status, message });
        }

        Ok(resp.json::<MessagesResponse>().await?)
    }
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    pub text: Option<String>,
}

impl MessagesResponse {
    /// Text of the first content block, the only part the summary is read from.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().and_then(|c| c.text.as_deref())
    }
}

impl Summarizer for AnthropicClient {
    const SUMMARIZER_MODEL: &'static str = "claude-haiku-4-5";

    type Error = SummarizeError;

    #[tracing::instrument(skip(self, transcript), fields(model = %self.model, chars = transcript.len()))]
    async fn summarize(&self, transcript: &str, title: &str) -> Result<SummaryRecord, Self::Error> {
        let response = self
            .send_message_request(build_prompt(transcript, title))
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize transcript"))?;

        if response.stop_reason.as_deref() == Some("max_tokens") {
            tracing::warn!("Summary hit the output token limit");
        }

        let text = response.first_text().ok_or(SummarizeError::EmptyContent)?;
        parse_summary_response(text)
    }
}
