//! Authentication of inbound payloads before they reach the renderer.

use engine_logging::{engine_debug, engine_warn};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::payload::DkimReport;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("missing webhook signature header")]
    MissingSignature,
    #[error("invalid webhook signature")]
    SignatureMismatch,
    #[error("missing DKIM data")]
    MissingDkim,
    #[error("envelope from {0} not in allowed list")]
    SenderNotAllowed(String),
    #[error("no DKIM results found")]
    NoDkimResults,
    #[error("no valid DKIM signatures found")]
    NoPassingSignature,
}

/// Lowercase hex HMAC-SHA256 of `body` keyed with `key`.
pub fn sign_body(key: &str, body: &[u8]) -> String {
    hex::encode(keyed_mac(key, body).finalize().into_bytes())
}

fn keyed_mac(key: &str, body: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    mac
}

/// Checks the webhook signature over the raw request body.
#[derive(Debug, Clone, Default)]
pub struct SignatureVerifier {
    key: Option<String>,
}

impl SignatureVerifier {
    pub fn new(key: Option<&str>) -> Self {
        Self {
            key: key.filter(|k| !k.is_empty()).map(str::to_string),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    /// Hex digits in either case are accepted. The digest comparison is
    /// constant-time.
    pub fn verify(&self, body: &[u8], provided: Option<&str>) -> Result<(), VerifyError> {
        let Some(key) = self.key.as_deref() else {
            engine_debug!("signature key not configured, skipping signature check");
            return Ok(());
        };
        let provided = provided.map(str::trim).ok_or(VerifyError::MissingSignature)?;
        let verified = hex::decode(provided)
            .ok()
            .map(|digest| keyed_mac(key, body).verify_slice(&digest).is_ok())
            .unwrap_or(false);
        if verified {
            Ok(())
        } else {
            engine_warn!("webhook signature mismatch");
            Err(VerifyError::SignatureMismatch)
        }
    }
}

/// Accepts mail only from listed envelope senders with a passing DKIM result.
#[derive(Debug, Clone, Default)]
pub struct DkimPolicy {
    allowed_senders: Vec<String>,
}

impl DkimPolicy {
    pub fn new(allowed_senders: Vec<String>) -> Self {
        Self { allowed_senders }
    }

    /// Returns the number of passing signatures.
    pub fn verify(&self, report: Option<&DkimReport>) -> Result<usize, VerifyError> {
        let report = report.ok_or(VerifyError::MissingDkim)?;
        let (Some(envelope_from), Some(results)) =
            (report.envelope_from.as_deref(), report.results.as_ref())
        else {
            return Err(VerifyError::MissingDkim);
        };

        if !self.allowed_senders.iter().any(|s| s == envelope_from) {
            return Err(VerifyError::SenderNotAllowed(envelope_from.to_string()));
        }
        if results.is_empty() {
            return Err(VerifyError::NoDkimResults);
        }

        let passed = results.iter().filter(|r| r.passed()).count();
        if passed == 0 {
            return Err(VerifyError::NoPassingSignature);
        }
        engine_debug!("DKIM verification passed with {} valid signature(s)", passed);
        Ok(passed)
    }
}
