//! Mailhook engine: the collaborators around the renderer. Settings,
//! payload verification, delivery, the stylized rewrite, the relay that
//! ties them together and the webhook endpoint in front of it.
mod decode;
mod deliver;
mod payload;
mod relay;
mod rewrite;
mod server;
mod settings;
mod verify;

pub use decode::{decode_markup, DecodeError, DecodedMarkup};
pub use deliver::{
    deliver_blocks, Deliverer, DeliveryError, DeliveryReport, DryRunDeliverer, WebhookDeliverer,
};
pub use payload::{DkimReport, DkimResult, DkimStatus, InboundEmail, RequestHeaders};
pub use relay::{Relay, RelayError, RelayOutcome};
pub use rewrite::{append_disclaimer, ChatRewriter, RewriteError, Rewriter, BODY_PLACEHOLDER};
pub use server::{webhook_router, CAPTURED_BODY_FILE, CAPTURED_HEADERS_FILE};
pub use settings::{RelaySettings, RewriteSettings, SettingsError};
pub use verify::{sign_body, DkimPolicy, SignatureVerifier, VerifyError, SIGNATURE_HEADER};
