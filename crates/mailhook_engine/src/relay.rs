use engine_logging::{engine_info, engine_warn};
use mailhook_core::{EmailRenderer, RenderedEmail};
use thiserror::Error;

use crate::deliver::{
    deliver_blocks, Deliverer, DeliveryError, DeliveryReport, DryRunDeliverer, WebhookDeliverer,
};
use crate::payload::{InboundEmail, RequestHeaders};
use crate::rewrite::{append_disclaimer, ChatRewriter, RewriteError, Rewriter};
use crate::settings::{RelaySettings, SettingsError};
use crate::verify::{DkimPolicy, SignatureVerifier, VerifyError, SIGNATURE_HEADER};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("authentication failed: {0}")]
    Auth(#[from] VerifyError),
    #[error("invalid request body: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("delivery setup failed: {0}")]
    Delivery(#[from] DeliveryError),
    #[error("rewriter setup failed: {0}")]
    Rewrite(#[from] RewriteError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub rendered: RenderedEmail,
    pub primary: DeliveryReport,
    /// Present when the stylized copy was produced and sent.
    pub stylized: Option<DeliveryReport>,
}

struct StylizedTarget {
    rewriter: Box<dyn Rewriter>,
    deliverer: Box<dyn Deliverer>,
}

/// Verifies an inbound email, renders it, and delivers the blocks.
pub struct Relay {
    signature: SignatureVerifier,
    dkim: DkimPolicy,
    renderer: EmailRenderer,
    primary: Box<dyn Deliverer>,
    stylized: Option<StylizedTarget>,
    disclaimers: Vec<String>,
}

impl Relay {
    pub fn new(settings: &RelaySettings, primary: Box<dyn Deliverer>) -> Result<Self, RelayError> {
        Ok(Self {
            signature: SignatureVerifier::new(settings.signature_key()),
            dkim: DkimPolicy::new(settings.allowed_senders.clone()),
            renderer: EmailRenderer::new(settings.render_config()?),
            primary,
            stylized: None,
            disclaimers: settings.disclaimers.clone(),
        })
    }

    pub fn with_stylized(
        mut self,
        rewriter: Box<dyn Rewriter>,
        deliverer: Box<dyn Deliverer>,
    ) -> Self {
        self.stylized = Some(StylizedTarget {
            rewriter,
            deliverer,
        });
        self
    }

    /// Builds webhook deliverers and the chat rewriter from settings. With
    /// `dry_run` every block is logged instead of sent.
    pub fn from_settings(settings: &RelaySettings, dry_run: bool) -> Result<Self, RelayError> {
        settings.validate()?;
        let timeout = settings.request_timeout();

        let primary: Box<dyn Deliverer> = match (dry_run, settings.delivery_url.as_deref()) {
            (true, _) => Box::new(DryRunDeliverer::new("primary")),
            (false, Some(url)) => Box::new(WebhookDeliverer::new(url, timeout)?),
            (false, None) => return Err(SettingsError::MissingField("delivery_url").into()),
        };
        let mut relay = Self::new(settings, primary)?;

        if let (true, Some(url)) = (
            settings.stylized_enabled(),
            settings.stylized_delivery_url.as_deref(),
        ) {
            let rewriter = ChatRewriter::new(settings.rewrite.clone(), timeout)?;
            let deliverer: Box<dyn Deliverer> = if dry_run {
                Box::new(DryRunDeliverer::new("stylized"))
            } else {
                Box::new(WebhookDeliverer::new(url, timeout)?)
            };
            relay = relay.with_stylized(Box::new(rewriter), deliverer);
        }
        Ok(relay)
    }

    pub fn renderer(&self) -> &EmailRenderer {
        &self.renderer
    }

    /// Authenticates the raw request and returns the parsed payload.
    pub fn authenticate(
        &self,
        raw_body: &[u8],
        headers: &RequestHeaders,
    ) -> Result<InboundEmail, RelayError> {
        self.signature.verify(raw_body, headers.get(SIGNATURE_HEADER))?;
        let email = InboundEmail::from_json(raw_body)?;
        self.dkim.verify(email.dkim.as_ref())?;
        Ok(email)
    }

    pub async fn handle(
        &self,
        raw_body: &[u8],
        headers: &RequestHeaders,
    ) -> Result<RelayOutcome, RelayError> {
        let email = match self.authenticate(raw_body, headers) {
            Ok(email) => email,
            Err(err) => {
                engine_warn!("rejected inbound email: {}", err);
                return Err(err);
            }
        };

        let rendered = self.renderer.render(&email.html, email.subject.as_deref());
        engine_info!(
            "rendered email into {} block(s) for {}",
            rendered.blocks.len(),
            self.primary.target()
        );
        let primary = deliver_blocks(self.primary.as_ref(), &rendered.blocks).await;

        let stylized = match &self.stylized {
            Some(target) => {
                let rewritten = target.rewriter.rewrite(&rendered.text).await;
                let text = append_disclaimer(&rewritten, &self.disclaimers);
                let blocks = self.renderer.split_blocks(&text);
                engine_info!(
                    "sending stylized copy in {} block(s) to {}",
                    blocks.len(),
                    target.deliverer.target()
                );
                Some(deliver_blocks(target.deliverer.as_ref(), &blocks).await)
            }
            None => None,
        };

        Ok(RelayOutcome {
            rendered,
            primary,
            stylized,
        })
    }
}
