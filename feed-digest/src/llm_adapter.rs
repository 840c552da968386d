use crate::types::{DigestError, Result};
use async_trait::async_trait;
use interfaces::{EmptySummarizer, Summarizer};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SUMMARY_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_ANALYST_MODEL: &str = "gpt-4o";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for OpenAI compatible endpoints.
pub struct OpenAiAdapter {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiAdapter {
    pub fn new(client: Client, api_key: &str, base_url: Option<&str>) -> Self {
        let base_url = base_url
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Self {
            client,
            api_key: api_key.to_string(),
            base_url,
        }
    }

    async fn chat(&self, model: &str, messages: Vec<ChatMessage<'_>>) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Requesting chat completion from {} with model {}", url, model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest { model, messages })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DigestError::Llm(format!("HTTP {}: {}", status, body)));
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| DigestError::Llm("completion returned no choices".to_string()))
    }
}

#[async_trait]
impl Summarizer for OpenAiAdapter {
    async fn summarize(&self, text: &str, model: &str) -> anyhow::Result<String> {
        let messages = vec![
            ChatMessage {
                role: "assistant",
                content: "Summarize the following text:",
            },
            ChatMessage {
                role: "user",
                content: text,
            },
        ];
        Ok(self.chat(model, messages).await?)
    }

    async fn complete(&self, prompt: &str, model: &str) -> anyhow::Result<String> {
        let messages = vec![ChatMessage {
            role: "user",
            content: prompt,
        }];
        Ok(self.chat(model, messages).await?)
    }
}

/// Picks the LLM backend for this run; without an API key nothing is summarized.
pub fn build_summarizer(client: Client, api_key: &str, base_url: Option<&str>) -> Arc<dyn Summarizer> {
    if api_key.is_empty() {
        info!("No LLM API key configured, summaries and analysis are disabled");
        Arc::new(EmptySummarizer)
    } else {
        Arc::new(OpenAiAdapter::new(client, api_key, base_url))
    }
}
