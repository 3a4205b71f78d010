use thiserror::Error;

/// Observed per-message character limit of the delivery target.
pub const DEFAULT_BLOCK_LIMIT: usize = 1800;
pub const DEFAULT_FOOTER_TAG: &str = "span";
pub const DEFAULT_FOOTER_CLASS: &str = "gmail_signature_prefix";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("block budget must be at least one character, got {0}")]
    InvalidBudget(usize),
    #[error("footer marker needs a tag and a class name")]
    EmptyFooterMarker,
}

/// Maximum number of characters per block. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget(usize);

impl Budget {
    pub fn new(chars: usize) -> Result<Self, ConfigError> {
        if chars == 0 {
            return Err(ConfigError::InvalidBudget(chars));
        }
        Ok(Self(chars))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self(DEFAULT_BLOCK_LIMIT)
    }
}

/// Element that starts the signature footer: `<{tag} class="... {class} ...">`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterMarker {
    tag: String,
    class: String,
}

impl FooterMarker {
    pub fn new(tag: impl Into<String>, class: impl Into<String>) -> Result<Self, ConfigError> {
        let tag = tag.into().trim().to_ascii_lowercase();
        let class = class.into().trim().to_string();
        if tag.is_empty() || class.is_empty() {
            return Err(ConfigError::EmptyFooterMarker);
        }
        Ok(Self { tag, class })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn class(&self) -> &str {
        &self.class
    }
}

impl Default for FooterMarker {
    fn default() -> Self {
        Self {
            tag: DEFAULT_FOOTER_TAG.to_string(),
            class: DEFAULT_FOOTER_CLASS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderConfig {
    pub budget: Budget,
    pub footer: FooterMarker,
}

impl RenderConfig {
    pub fn new(budget_chars: usize, footer: FooterMarker) -> Result<Self, ConfigError> {
        Ok(Self {
            budget: Budget::new(budget_chars)?,
            footer,
        })
    }
}
