use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;

/// A single non-streaming chat completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

#[async_trait]
pub trait MealPlanModel: Send + Sync {
    /// Returns the assistant message content, possibly empty.
    async fn complete(&self, prompt: &ChatPrompt) -> anyhow::Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client (OpenRouter by default).
#[derive(Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    referer: String,
    title: String,
}

impl ChatCompletionsClient {
    pub fn new(cfg: &LlmConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build llm http client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            referer: cfg.referer.clone(),
            title: cfg.title.clone(),
        })
    }
}

#[async_trait]
impl MealPlanModel for ChatCompletionsClient {
    async fn complete(&self, prompt: &ChatPrompt) -> anyhow::Result<String> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: prompt.temperature,
            stream: false,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&body)
            .send()
            .await
            .context("chat completion request")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(300).collect();
            anyhow::bail!("chat completion failed with status {status}: {snippet}");
        }

        let parsed: ChatCompletionResponse =
            resp.json().await.context("decode chat completion")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();
        debug!(model = %self.model, content_len = content.len(), "chat completion received");
        Ok(content.trim().to_string())
    }
}
