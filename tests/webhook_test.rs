//! Webhook intake tests.
//!
//! Drives the router with `tower::ServiceExt::oneshot` and a counting call
//! provider, checking status codes, response bodies, CORS handling and what
//! does or does not get scheduled.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use rides_callback::api::vapi_client::CallProvider;
use rides_callback::config::settings::Settings;
use rides_callback::error::ProviderError;
use rides_callback::jobs::dispatcher::CallbackDispatcher;
use rides_callback::models::contact_models::{CallOutcome, CallRequest};
use rides_callback::{create_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Default)]
struct RecordingProvider {
    calls: AtomicUsize,
    requests: Mutex<Vec<CallRequest>>,
}

impl RecordingProvider {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CallProvider for RecordingProvider {
    async fn place_call(&self, request: &CallRequest) -> Result<CallOutcome, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CallOutcome::placed("call_test", "ok"))
    }
}

fn app_with_delay(delay: Duration) -> (Router, Arc<RecordingProvider>) {
    let provider = Arc::new(RecordingProvider::default());
    let settings = Settings {
        callback_delay: delay,
        ..Settings::default()
    };
    let state = Arc::new(AppState {
        dispatcher: CallbackDispatcher::new(provider.clone(), delay),
        settings,
    });
    (create_router(state), provider)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response should be valid JSON")
}

/// Waits (in real time) until the provider saw `expected` calls or gives up.
async fn wait_for_calls(provider: &RecordingProvider, expected: usize) {
    for _ in 0..100 {
        if provider.calls() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn valid_submission_is_normalized_and_scheduled() {
    let (app, provider) = app_with_delay(Duration::from_secs(120));

    let response = app
        .oneshot(post_json(
            "/api/webhook",
            json!({
                "name": "John Smith",
                "phone": "071 234 5678",
                "email": "john.smith@example.com",
                "interested_service": "Daily commute rides",
                "preferred_time": "Morning",
                "message": "I need a reliable ride to work every day"
            }),
        ))
        .await
        .expect("failed to make request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    assert_eq!(body["success"], json!(true));
    assert_eq!(
        body["message"],
        json!("Callback scheduled for John Smith at +27712345678 in 2 minutes")
    );
    assert_eq!(body["data"]["name"], json!("John Smith"));
    assert_eq!(body["data"]["phone"], json!("+27712345678"));
    assert_eq!(body["data"]["interested_service"], json!("Daily commute rides"));

    let scheduled_for = body["data"]["scheduledFor"].as_str().expect("scheduledFor should be a string");
    let scheduled_for = chrono::DateTime::parse_from_rfc3339(scheduled_for).expect("scheduledFor should be RFC 3339");
    assert!(scheduled_for > chrono::Utc::now() + chrono::Duration::seconds(100));

    // two minutes have not passed
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn missing_required_fields_return_400_and_schedule_nothing() {
    let (app, provider) = app_with_delay(Duration::ZERO);

    let bodies = [
        json!({"phone": "+1234567890"}),
        json!({"name": "John Smith"}),
        json!({"name": "   ", "phone": "+1234567890"}),
        json!({"name": "John Smith", "phone": ""}),
        json!({}),
    ];

    for body in bodies {
        let response = app
            .clone()
            .oneshot(post_json("/api/webhook", body.clone()))
            .await
            .expect("failed to make request");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        let body = json_body(response).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["message"], json!("Missing required fields: name and phone"));
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn malformed_json_returns_400() {
    let (app, provider) = app_with_delay(Duration::ZERO);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.expect("failed to make request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], json!(false));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn non_post_methods_return_405() {
    let (app, _provider) = app_with_delay(Duration::from_secs(120));

    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let request = Request::builder()
            .method(method.clone())
            .uri("/api/webhook")
            .body(Body::empty())
            .unwrap();

        let response = app.clone().oneshot(request).await.expect("failed to make request");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "method: {method}");
        let body = json_body(response).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["message"], json!("Method not allowed. Use POST."));
    }
}

#[tokio::test]
async fn options_always_returns_200_with_cors_headers() {
    let (app, provider) = app_with_delay(Duration::ZERO);

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/webhook")
        .header(header::ORIGIN, "https://myrides.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(preflight).await.expect("failed to make request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );

    // a body, even a garbage one, changes nothing
    let with_body = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/webhook")
        .header(header::ORIGIN, "https://myrides.example")
        .body(Body::from("{\"name\": 42"))
        .unwrap();

    let response = app.clone().oneshot(with_body).await.expect("failed to make request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());

    // the callback form route is covered by the same layer
    let callback_preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/callback")
        .header(header::ORIGIN, "https://myrides.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(callback_preflight).await.expect("failed to make request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn post_responses_carry_cors_origin() {
    let (app, _provider) = app_with_delay(Duration::from_secs(120));

    let mut request = post_json("/api/webhook", json!({"name": "Ann", "phone": "+1 234-567-8900"}));
    request
        .headers_mut()
        .insert(header::ORIGIN, "https://myrides.example".parse().unwrap());

    let response = app.oneshot(request).await.expect("failed to make request");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
    assert_eq!(json_body(response).await["data"]["phone"], json!("+12345678900"));
}

#[tokio::test]
async fn zapier_alias_behaves_like_webhook() {
    let (app, _provider) = app_with_delay(Duration::from_secs(120));

    let response = app
        .oneshot(post_json("/api/zapier-webhook", json!({"name": "John Smith", "phone": "+1234567890"})))
        .await
        .expect("failed to make request");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["phone"], json!("+1234567890"));
}

#[tokio::test(start_paused = true)]
async fn webhook_call_fires_once_after_two_minutes() {
    let (app, provider) = app_with_delay(Duration::from_secs(120));

    let response = app
        .oneshot(post_json(
            "/api/webhook",
            json!({"name": "John Smith", "phone": "+1234567890", "interested_service": "Airport rides"}),
        ))
        .await
        .expect("failed to make request");
    assert_eq!(response.status(), StatusCode::OK);

    tokio::time::advance(Duration::from_millis(119_999)).await;
    tokio::task::yield_now().await;
    assert_eq!(provider.calls(), 0);

    tokio::time::advance(Duration::from_millis(1)).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(provider.calls(), 1);

    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests[0].customer_number, "+1234567890");
    assert!(requests[0].system_prompt.contains("- Name: John Smith"));
    assert!(requests[0].system_prompt.contains("- Interested in: Airport rides"));
}

#[tokio::test]
async fn callback_form_dials_immediately_with_base_script() {
    let (app, provider) = app_with_delay(Duration::from_secs(120));

    let response = app
        .oneshot(post_json(
            "/api/callback",
            json!({"name": "Lerato", "phone": "082 555 0101", "email": "lerato@example.com"}),
        ))
        .await
        .expect("failed to make request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], json!("Callback scheduled for Lerato at +27825550101 now"));

    wait_for_calls(&provider, 1).await;
    assert_eq!(provider.calls(), 1);

    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests[0].customer_email.as_deref(), Some("lerato@example.com"));
    assert!(!requests[0].system_prompt.contains("CUSTOMER CONTEXT"));
}

#[tokio::test]
async fn scheduling_failure_returns_500() {
    let (app, provider) = app_with_delay(Duration::MAX);

    let response = app
        .oneshot(post_json("/api/webhook", json!({"name": "John Smith", "phone": "+1234567890"})))
        .await
        .expect("failed to make request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body, json!({"success": false, "message": "Internal server error"}));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn health_check_returns_ok() {
    let (app, _provider) = app_with_delay(Duration::from_secs(120));

    let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.expect("failed to make request");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}
