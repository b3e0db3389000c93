//! OpenAI-compatible chat completions plan provider

use super::{PlanError, PlanProvider, PLAN_PROVIDER_ERROR, PLAN_UNAVAILABLE};
use crate::models::PlanConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const SYSTEM_PROMPT: &str = "Be terse. Bullet points only.";
const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 250;

/// Live plan provider
pub struct OpenAiPlan {
    client: Client,
    config: PlanConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// User prompt embedding the task and pipe-joined facts
pub(crate) fn user_prompt(task: &str, facts: &[String]) -> String {
    format!(
        "Task: {}\nFacts: {}\nOutput: 4-6 bullets, minimal plan for a one-week win.",
        task,
        facts.join(" | ")
    )
}

impl OpenAiPlan {
    /// No request timeout is set; the provider's own limits apply.
    pub fn new(config: PlanConfig) -> Result<Self, PlanError> {
        if config.api_key.is_none() {
            return Err(PlanError::MissingApiKey);
        }
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    /// One completion request. `Ok(None)` when the provider sent no content.
    async fn complete(&self, task: &str, facts: &[String]) -> Result<Option<String>, PlanError> {
        let api_key = self.config.api_key.as_deref().ok_or(PlanError::MissingApiKey)?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(task, facts),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PlanError::Provider { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        Ok(chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content))
    }
}

#[async_trait]
impl PlanProvider for OpenAiPlan {
    fn name(&self) -> &str {
        "openai"
    }

    async fn plan(&self, task: &str, facts: &[String]) -> String {
        let start = Instant::now();
        match self.complete(task, facts).await {
            Ok(Some(content)) => {
                tracing::debug!(
                    model = %self.config.model,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Plan generated"
                );
                content
            }
            Ok(None) => PLAN_UNAVAILABLE.to_string(),
            Err(e) => {
                tracing::warn!(model = %self.config.model, "Plan provider failed: {}", e);
                PLAN_PROVIDER_ERROR.to_string()
            }
        }
    }
}
