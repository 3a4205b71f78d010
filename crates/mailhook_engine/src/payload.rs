use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// JSON body posted by the inbound email webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEmail {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub dkim: Option<DkimReport>,
}

impl InboundEmail {
    pub fn from_json(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DkimReport {
    #[serde(default)]
    pub envelope_from: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<DkimResult>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DkimResult {
    #[serde(default)]
    pub status: Option<DkimStatus>,
}

impl DkimResult {
    pub fn passed(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.result.as_deref())
            .map(|r| r == "pass")
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DkimStatus {
    #[serde(default)]
    pub result: Option<String>,
}

/// Request headers with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: BTreeMap<String, String>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.entries.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// JSON object of header names to values, the form [`Self::from_json`] reads.
    pub fn to_json(&self) -> serde_json::Value {
        self.entries
            .iter()
            .map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
            .collect::<serde_json::Map<_, _>>()
            .into()
    }

    /// Reads a saved JSON object of header names to values. Non-string
    /// values are kept in their JSON form.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let map: BTreeMap<String, serde_json::Value> = serde_json::from_str(raw)?;
        let mut headers = Self::new();
        for (name, value) in map {
            match value {
                serde_json::Value::String(text) => headers.insert(&name, text),
                other => headers.insert(&name, other.to_string()),
            }
        }
        Ok(headers)
    }
}
