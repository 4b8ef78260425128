use axum::body::Body;
use axum::http::{Request, StatusCode};
use hnsw_server::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_KEY: &str = "test-admin-key";

fn test_app() -> axum::Router {
    // Tests only exercise the in-memory backing, so the data dir is
    // never actually written to.
    let state = Arc::new(AppState::new(ADMIN_KEY.to_string(), "./data".into()));
    build_router(state)
}

fn authed(builder: axum::http::request::Builder) -> axum::http::request::Builder {
    builder.header("Authorization", format!("Bearer {ADMIN_KEY}"))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn rejects_requests_without_bearer_token() {
    let app = test_app();
    let request = Request::builder().uri("/v1/indexes").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_then_duplicate_index_conflicts() {
    let app = test_app();
    let body = json!({"name": "docs", "dimension": 4}).to_string();
    let request = authed(Request::builder().method("POST").uri("/v1/indexes"))
        .header("Content-Type", "application/json")
        .body(Body::from(body.clone()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let request = authed(Request::builder().method("POST").uri("/v1/indexes"))
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn rejects_unknown_distance_metric() {
    let app = test_app();
    let body = json!({"name": "docs", "dimension": 4, "distance": "manhattan"}).to_string();
    let request = authed(Request::builder().method("POST").uri("/v1/indexes"))
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn add_vector_then_search_round_trip() {
    let app = test_app();
    let create = json!({"name": "docs", "dimension": 2}).to_string();
    let request = authed(Request::builder().method("POST").uri("/v1/indexes"))
        .header("Content-Type", "application/json")
        .body(Body::from(create))
        .unwrap();
    assert_eq!(app.clone().oneshot(request).await.unwrap().status(), StatusCode::CREATED);

    for (id, vector) in [
        ("00000000000000000000000000000001", json!([0.0, 0.0])),
        ("00000000000000000000000000000002", json!([10.0, 10.0])),
    ] {
        let body = json!({"id": id, "vector": vector}).to_string();
        let request = authed(Request::builder().method("POST").uri("/v1/indexes/docs/vectors"))
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .unwrap();
        assert_eq!(app.clone().oneshot(request).await.unwrap().status(), StatusCode::CREATED);
    }

    let search = json!({"query": [0.1, 0.1], "k": 1}).to_string();
    let request = authed(Request::builder().method("POST").uri("/v1/indexes/docs/search"))
        .header("Content-Type", "application/json")
        .body(Body::from(search))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["results"][0]["id"], "00000000000000000000000000000001");

    let request = authed(Request::builder()
        .method("DELETE")
        .uri("/v1/indexes/docs/vectors/00000000000000000000000000000001"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.oneshot(request).await.unwrap().status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn unknown_index_and_vector_are_not_found() {
    let app = test_app();
    let request = authed(Request::builder().uri("/v1/indexes/missing")).body(Body::empty()).unwrap();
    assert_eq!(app.clone().oneshot(request).await.unwrap().status(), StatusCode::NOT_FOUND);

    let create = json!({"name": "docs", "dimension": 2}).to_string();
    let request = authed(Request::builder().method("POST").uri("/v1/indexes"))
        .header("Content-Type", "application/json")
        .body(Body::from(create))
        .unwrap();
    assert_eq!(app.clone().oneshot(request).await.unwrap().status(), StatusCode::CREATED);

    let request = authed(Request::builder()
        .method("DELETE")
        .uri("/v1/indexes/docs/vectors/00000000000000000000000000000099"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        app.oneshot(request).await.unwrap().status(),
        StatusCode::NO_CONTENT,
        "removing an absent id is success, not failure"
    );
}
