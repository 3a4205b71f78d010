use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mailhook_core::{
    ConfigError, FooterMarker, RenderConfig, DEFAULT_BLOCK_LIMIT, DEFAULT_FOOTER_CLASS,
    DEFAULT_FOOTER_TAG,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::rewrite::BODY_PLACEHOLDER;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("{field} is not a valid http(s) url: {message}")]
    InvalidUrl { field: &'static str, message: String },
    #[error("{0} must be set")]
    MissingField(&'static str),
    #[error("rewrite.prompt_template must contain {placeholder}", placeholder = BODY_PLACEHOLDER)]
    MissingPlaceholder,
    #[error(transparent)]
    Render(#[from] ConfigError),
}

/// Settings for the optional stylized rewrite through a chat-completions API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteSettings {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub prompt_template: String,
}

impl Default for RewriteSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4.1-mini".to_string(),
            temperature: 0.5,
            max_tokens: 5000,
            system_prompt: "Rewrite the email you are given in a casual, playful style. \
                            Keep every date, time, place and name exactly as written."
                .to_string(),
            prompt_template: BODY_PLACEHOLDER.to_string(),
        }
    }
}

/// Relay configuration, read from a RON file. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Port the `serve` command listens on.
    pub port: u16,
    /// Path segment the webhook is posted to, with or without slashes.
    pub webhook_path: String,
    pub delivery_url: Option<String>,
    pub stylized_delivery_url: Option<String>,
    pub enable_stylized_rewrite: bool,
    /// Shared secret for the `x-webhook-signature` check; unset skips it.
    pub signature_key: Option<String>,
    pub allowed_senders: Vec<String>,
    pub block_limit: usize,
    pub footer_class: String,
    pub request_timeout_secs: u64,
    pub rewrite: RewriteSettings,
    pub disclaimers: Vec<String>,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            port: 5401,
            webhook_path: "webhook".to_string(),
            delivery_url: None,
            stylized_delivery_url: None,
            enable_stylized_rewrite: false,
            signature_key: None,
            allowed_senders: Vec::new(),
            block_limit: DEFAULT_BLOCK_LIMIT,
            footer_class: DEFAULT_FOOTER_CLASS.to_string(),
            request_timeout_secs: 30,
            rewrite: RewriteSettings::default(),
            disclaimers: vec![
                "Rewritten automatically and may contain mistakes. Check dates, times and places against the original."
                    .to_string(),
            ],
        }
    }
}

impl RelaySettings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&content)
    }

    pub fn from_ron_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = ron::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_url("delivery_url", self.delivery_url.as_deref())?;
        validate_url("stylized_delivery_url", self.stylized_delivery_url.as_deref())?;
        validate_url("rewrite.api_base", Some(&self.rewrite.api_base))?;
        self.render_config()?;
        if self.stylized_enabled() && !self.rewrite.prompt_template.contains(BODY_PLACEHOLDER) {
            return Err(SettingsError::MissingPlaceholder);
        }
        Ok(())
    }

    pub fn render_config(&self) -> Result<RenderConfig, SettingsError> {
        let footer = FooterMarker::new(DEFAULT_FOOTER_TAG, self.footer_class.as_str())?;
        Ok(RenderConfig::new(self.block_limit, footer)?)
    }

    /// The stylized copy is produced only when enabled and a target exists.
    pub fn stylized_enabled(&self) -> bool {
        self.enable_stylized_rewrite && self.stylized_delivery_url.is_some()
    }

    /// `webhook_path` as an absolute route, e.g. `hooks/mail/` gives `/hooks/mail`.
    pub fn webhook_route(&self) -> String {
        format!("/{}", self.webhook_path.trim_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Signature key with blank values treated as unset.
    pub fn signature_key(&self) -> Option<&str> {
        self.signature_key.as_deref().filter(|k| !k.is_empty())
    }
}

fn validate_url(field: &'static str, value: Option<&str>) -> Result<(), SettingsError> {
    let Some(value) = value else {
        return Ok(());
    };
    let parsed = Url::parse(value).map_err(|err| SettingsError::InvalidUrl {
        field,
        message: err.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SettingsError::InvalidUrl {
            field,
            message: format!("unsupported scheme {other}"),
        }),
    }
}
