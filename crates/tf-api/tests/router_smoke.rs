use std::sync::Arc;

use axum::{body::Body, http::Request, http::StatusCode};
use tf_common::db::MemoryStore;
use tower::ServiceExt;

#[tokio::test]
async fn livez_is_healthy_and_echoes_request_id() {
    let app = tf_api::create_router(tf_api::test_state(Arc::new(MemoryStore::demo())));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/livez").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/livez")
                .header("x-request-id", "smoke-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "smoke-1");
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let app = tf_api::create_router(tf_api::test_state(Arc::new(MemoryStore::demo())));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/projects")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
