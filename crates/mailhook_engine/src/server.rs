//! HTTP endpoint that receives inbound email webhooks and runs them through
//! a [`Relay`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};

use crate::payload::RequestHeaders;
use crate::relay::{Relay, RelayError};
use crate::verify::VerifyError;

/// File names written by request capture, read back by `replay`.
pub const CAPTURED_BODY_FILE: &str = "request_body.json";
pub const CAPTURED_HEADERS_FILE: &str = "request_headers.json";

#[derive(Clone)]
struct ServerState {
    relay: Arc<Relay>,
    capture_dir: Option<Arc<PathBuf>>,
}

/// Router with a single `POST route` handler.
///
/// With `capture_dir` set, every request body and its headers are saved
/// there before processing, overwriting the previous capture.
pub fn webhook_router(relay: Arc<Relay>, route: &str, capture_dir: Option<PathBuf>) -> Router {
    let state = ServerState {
        relay,
        capture_dir: capture_dir.map(Arc::new),
    };
    Router::new()
        .route(route, post(receive))
        .with_state(state)
}

async fn receive(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    engine_info!("received webhook request ({} bytes)", body.len());
    let headers = request_headers(&headers);
    if let Some(dir) = &state.capture_dir {
        capture(dir, &body, &headers);
    }

    match state.relay.handle(&body, &headers).await {
        Ok(outcome) => {
            let complete = outcome.primary.is_complete()
                && outcome.stylized.as_ref().map_or(true, |r| r.is_complete());
            if complete {
                (StatusCode::OK, "OK".to_string())
            } else {
                engine_error!("some blocks could not be delivered");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error processing email".to_string(),
                )
            }
        }
        Err(err) => error_response(&err),
    }
}

fn error_response(err: &RelayError) -> (StatusCode, String) {
    match err {
        RelayError::Auth(VerifyError::MissingSignature | VerifyError::SignatureMismatch) => (
            StatusCode::FORBIDDEN,
            "Invalid webhook signature".to_string(),
        ),
        RelayError::Auth(reason) => (
            StatusCode::FORBIDDEN,
            format!("DKIM verification failed: {reason}"),
        ),
        RelayError::Payload(_) => (
            StatusCode::BAD_REQUEST,
            "Invalid request body or signature".to_string(),
        ),
        other => {
            engine_error!("error processing email: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing email".to_string(),
            )
        }
    }
}

fn request_headers(headers: &HeaderMap) -> RequestHeaders {
    let mut out = RequestHeaders::new();
    for (name, value) in headers {
        match value.to_str() {
            Ok(value) => out.insert(name.as_str(), value),
            Err(_) => engine_debug!("skipping non-ascii header {}", name),
        }
    }
    out
}

/// Best effort: a failed capture is logged and the request still processed.
fn capture(dir: &Path, body: &[u8], headers: &RequestHeaders) {
    let body_path = dir.join(CAPTURED_BODY_FILE);
    if let Err(err) = fs::write(&body_path, body) {
        engine_warn!("could not save request body to {:?}: {}", body_path, err);
        return;
    }
    let headers_path = dir.join(CAPTURED_HEADERS_FILE);
    let written = serde_json::to_vec_pretty(&headers.to_json())
        .map_err(std::io::Error::from)
        .and_then(|json| fs::write(&headers_path, json));
    match written {
        Ok(()) => engine_debug!("saved request to {:?}", dir),
        Err(err) => engine_warn!("could not save request headers to {:?}: {}", headers_path, err),
    }
}
