//! Optional stylized rewrite of the rendered text through a chat-completions
//! API. Failures never block delivery: the original text is used instead.

use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::json;

use crate::settings::RewriteSettings;

/// Where the email text goes inside `RewriteSettings::prompt_template`.
pub const BODY_PLACEHOLDER: &str = "{{ email_body }}";
const DISCLAIMER_SEPARATOR: &str = "\n\n---\n";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    #[error("no api key configured for the rewriter")]
    MissingApiKey,
    #[error("rewriter request timed out")]
    Timeout,
    #[error("rewriter answered with http status {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("rewriter returned no content")]
    EmptyResponse,
}

/// Produces an alternate version of the text. Implementations are fail-open
/// and return the input unchanged when anything goes wrong.
#[async_trait::async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(&self, text: &str) -> String;
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatRewriter {
    client: reqwest::Client,
    settings: RewriteSettings,
}

impl ChatRewriter {
    pub fn new(settings: RewriteSettings, timeout: Duration) -> Result<Self, RewriteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RewriteError::Network(err.to_string()))?;
        Ok(Self { client, settings })
    }

    fn build_prompt(&self, text: &str) -> String {
        self.settings
            .prompt_template
            .replacen(BODY_PLACEHOLDER, text, 1)
    }

    pub async fn try_rewrite(&self, text: &str) -> Result<String, RewriteError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(RewriteError::MissingApiKey)?;
        let endpoint = format!(
            "{}/chat/completions",
            self.settings.api_base.trim_end_matches('/')
        );
        let body = json!({
            "model": self.settings.model,
            "messages": [
                { "role": "system", "content": self.settings.system_prompt },
                { "role": "user", "content": self.build_prompt(text) },
            ],
            "max_tokens": self.settings.max_tokens,
            "temperature": self.settings.temperature,
        });

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RewriteError::HttpStatus(status.as_u16()));
        }

        let parsed: ChatResponse = response.json().await.map_err(map_reqwest_error)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(RewriteError::EmptyResponse)
    }
}

#[async_trait::async_trait]
impl Rewriter for ChatRewriter {
    async fn rewrite(&self, text: &str) -> String {
        engine_debug!("requesting stylized rewrite with model {}", self.settings.model);
        match self.try_rewrite(text).await {
            Ok(rewritten) => rewritten,
            Err(err) => {
                engine_warn!("stylized rewrite failed, using original text: {}", err);
                text.to_string()
            }
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> RewriteError {
    if err.is_timeout() {
        return RewriteError::Timeout;
    }
    RewriteError::Network(err.to_string())
}

/// Appends one randomly chosen disclaimer under a rule line.
pub fn append_disclaimer(text: &str, disclaimers: &[String]) -> String {
    match disclaimers.choose(&mut rand::thread_rng()) {
        Some(disclaimer) => format!("{text}{DISCLAIMER_SEPARATOR}{disclaimer}"),
        None => text.to_string(),
    }
}
