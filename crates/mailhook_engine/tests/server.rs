use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use mailhook_engine::{
    sign_body, webhook_router, Deliverer, DeliveryError, Relay, RelaySettings, RequestHeaders,
    CAPTURED_BODY_FILE, CAPTURED_HEADERS_FILE, SIGNATURE_HEADER,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt;

const KEY: &str = "hook-key";
const ROUTE: &str = "/webhook";

#[derive(Clone, Default)]
struct SharedDeliverer {
    sent: Arc<Mutex<Vec<String>>>,
    failing: bool,
}

#[async_trait::async_trait]
impl Deliverer for SharedDeliverer {
    fn target(&self) -> &str {
        "shared"
    }

    async fn deliver(&self, block: &str) -> Result<(), DeliveryError> {
        if self.failing {
            return Err(DeliveryError::HttpStatus(502));
        }
        self.sent.lock().unwrap().push(block.to_string());
        Ok(())
    }
}

fn router(deliverer: SharedDeliverer, capture_dir: Option<std::path::PathBuf>) -> Router {
    let settings = RelaySettings {
        signature_key: Some(KEY.to_string()),
        allowed_senders: vec!["club@example.com".to_string()],
        ..RelaySettings::default()
    };
    let relay = Relay::new(&settings, Box::new(deliverer)).unwrap();
    webhook_router(Arc::new(relay), ROUTE, capture_dir)
}

fn email(result: &str) -> Vec<u8> {
    json!({
        "html": "<div>Doors open</div><div>at 7</div>",
        "subject": "Gig",
        "dkim": {
            "envelopeFrom": "club@example.com",
            "results": [ { "status": { "result": result } } ]
        }
    })
    .to_string()
    .into_bytes()
}

fn post(body: Vec<u8>, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(ROUTE)
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn accepted_email_is_delivered_and_answered_ok() {
    let deliverer = SharedDeliverer::default();
    let body = email("pass");
    let signature = sign_body(KEY, &body);

    let (status, text) = send(router(deliverer.clone(), None), post(body, Some(signature))).await;

    assert_eq!((status, text.as_str()), (StatusCode::OK, "OK"));
    assert_eq!(
        *deliverer.sent.lock().unwrap(),
        vec!["**Gig**\n\nDoors open at 7".to_string()]
    );
}

#[tokio::test]
async fn bad_signature_is_forbidden() {
    let deliverer = SharedDeliverer::default();
    let (status, text) = send(
        router(deliverer.clone(), None),
        post(email("pass"), Some("deadbeef".to_string())),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(text, "Invalid webhook signature");
    assert!(deliverer.sent.lock().unwrap().is_empty());

    let (status, _) = send(router(deliverer, None), post(email("pass"), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn failed_dkim_is_forbidden_with_reason() {
    let body = email("fail");
    let signature = sign_body(KEY, &body);
    let (status, text) = send(
        router(SharedDeliverer::default(), None),
        post(body, Some(signature)),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(text.starts_with("DKIM verification failed: "), "{text}");
}

#[tokio::test]
async fn unparseable_body_is_a_bad_request() {
    let body = b"{\"html\": ".to_vec();
    let signature = sign_body(KEY, &body);
    let (status, text) = send(
        router(SharedDeliverer::default(), None),
        post(body, Some(signature)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "Invalid request body or signature");
}

#[tokio::test]
async fn delivery_failure_is_a_server_error() {
    let deliverer = SharedDeliverer {
        failing: true,
        ..SharedDeliverer::default()
    };
    let body = email("pass");
    let signature = sign_body(KEY, &body);
    let (status, text) = send(router(deliverer, None), post(body, Some(signature))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text, "Error processing email");
}

#[tokio::test]
async fn only_posts_to_the_webhook_route_are_handled() {
    let request = Request::builder()
        .method("POST")
        .uri("/elsewhere")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(router(SharedDeliverer::default(), None), request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = Request::builder().uri(ROUTE).body(Body::empty()).unwrap();
    let (status, _) = send(router(SharedDeliverer::default(), None), request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn capture_saves_raw_body_and_headers() {
    let dir = tempfile::tempdir().unwrap();
    let body = email("pass");
    let signature = sign_body(KEY, &body);

    let (status, _) = send(
        router(SharedDeliverer::default(), Some(dir.path().to_path_buf())),
        post(body.clone(), Some(signature.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let saved_body = std::fs::read(dir.path().join(CAPTURED_BODY_FILE)).unwrap();
    assert_eq!(saved_body, body);
    let saved_headers =
        std::fs::read_to_string(dir.path().join(CAPTURED_HEADERS_FILE)).unwrap();
    let headers = RequestHeaders::from_json(&saved_headers).unwrap();
    assert_eq!(headers.get(SIGNATURE_HEADER), Some(signature.as_str()));
    assert_eq!(headers.get("Content-Type"), Some("application/json"));
}
