mod helpers;

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use helpers::*;
use roam::extraction::Extraction;
use roam::server::{router, AppState};
use tower::ServiceExt;

fn app(extractor: &ScriptedExtractor) -> Router {
    let state = AppState {
        controller: controller(extractor, true),
        db: Arc::new(Mutex::new(test_db())),
        search_limit: 10,
    };
    router(Arc::new(state))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_database_stats() {
    let app = app(&ScriptedExtractor::default());

    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"]["integrity_ok"], true);
    assert_eq!(body["database"]["town_count"], 3);
}

#[tokio::test]
async fn chat_turn_returns_tagged_response_and_conversation() {
    let extractor = ScriptedExtractor::new(vec![Ok(Extraction::create(host_only("Mia")))]);
    let app = app(&extractor);

    let (status, body) = send(
        &app,
        post_json("/api/chat", serde_json::json!({ "text": "Mia is hosting" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"]["kind"], "follow_up");
    assert_eq!(body["response"]["questions"].as_array().unwrap().len(), 3);
    assert_eq!(body["conversation"]["state"], "gathering");
    assert_eq!(body["conversation"]["draft"]["host"]["name"], "Mia");
}

#[tokio::test]
async fn chat_carries_conversation_from_request() {
    let extractor = ScriptedExtractor::default();
    let app = app(&extractor);
    let conversation = serde_json::json!({
        "state": "confirming",
        "draft": {
            "title": "Sunrise yoga",
            "town": "Cabarete",
            "host": { "name": "Mia" },
            "location": { "name": "Kite Beach" },
            "occurrences": [{ "start_ts": "2025-06-01T08:00:00-04:00" }]
        }
    });

    let (status, body) = send(
        &app,
        post_json(
            "/api/chat",
            serde_json::json!({ "text": "yes", "conversation": conversation }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(extractor.calls(), 0);
    assert_eq!(body["response"]["kind"], "ready");
    assert_eq!(body["response"]["draft"]["title"], "Sunrise yoga");
    assert_eq!(body["conversation"]["state"], "ready");
}

#[tokio::test]
async fn chat_search_intent() {
    let extractor = ScriptedExtractor::new(vec![Ok(Extraction::search("yoga"))]);
    let app = app(&extractor);

    let (status, body) = send(
        &app,
        post_json("/api/chat", serde_json::json!({ "text": "any yoga?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"]["kind"], "search");
    assert_eq!(body["response"]["query"], "yoga");
}

#[tokio::test]
async fn chat_rejects_empty_text() {
    let extractor = ScriptedExtractor::default();
    let app = app(&extractor);

    let (status, body) = send(&app, post_json("/api/chat", serde_json::json!({ "text": "   " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(extractor.calls(), 0);
}

#[tokio::test]
async fn publish_then_search_finds_event() {
    let app = app(&ScriptedExtractor::default());
    let draft = complete_draft("Sunrise yoga", "Cabarete", "2025-06-01T08:00:00");

    let (status, body) = send(
        &app,
        post_json("/api/publish", serde_json::json!({ "draft": draft })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].is_string());
    assert_eq!(body["title"], "Sunrise yoga");
    assert_eq!(body["occurrences"][0]["start_ts"], "2025-06-01T08:00:00-04:00");

    let (status, body) = send(&app, get("/api/search?q=yoga&town=Cabarete")).await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["title"], "Sunrise yoga");
}

#[tokio::test]
async fn publish_incomplete_draft_is_unprocessable() {
    let app = app(&ScriptedExtractor::default());

    let (status, body) = send(
        &app,
        post_json(
            "/api/publish",
            serde_json::json!({ "draft": { "host": { "name": "Mia" } } }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["details"]["missing"],
        serde_json::json!(["title", "location name", "start time"])
    );
}

#[tokio::test]
async fn search_requires_query() {
    let app = app(&ScriptedExtractor::default());

    let (status, _) = send(&app, get("/api/search")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/api/search?q=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
