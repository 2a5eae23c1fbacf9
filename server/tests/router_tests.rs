//! HTTP-level tests that never reach the database.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use potluck_server::config::Config;
use potluck_server::{api, app, db, AppState};
use serde_json::Value;
use tower::ServiceExt;

const UNREACHABLE_DB: &str = "postgres://potluck@127.0.0.1:1/potluck";

fn test_app() -> axum::Router {
    let config = Config::for_host(UNREACHABLE_DB, "https://potluck.example/");
    app(AppState::new(db::lazy_pool(UNREACHABLE_DB), config))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = test_app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn unauthed_ping_responds() {
    let (status, body) = send(get("/api/test/unauthed-ping")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "unauthed-ping");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    for uri in [
        "/api/users/me",
        "/api/users/subscriptions",
        "/api/recipes/download_shopping_cart",
    ] {
        let (status, body) = send(get(uri)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "Missing Authorization header", "{uri}");
    }
}

#[tokio::test]
async fn wrong_auth_scheme_is_rejected_before_the_body_is_read() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/recipes")
        .header(header::AUTHORIZATION, "Token abc")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid Authorization header format");
}

#[tokio::test]
async fn malformed_short_link_is_not_found() {
    for uri in ["/s/ab/", "/s/toolong/", "/s/a-b/"] {
        let (status, _) = send(get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (status, body) = send(get("/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);

    let paths = body["paths"].as_object().unwrap();
    for path in [
        "/api/recipes",
        "/api/recipes/{id}/get-link",
        "/api/recipes/download_shopping_cart",
        "/api/users/{id}/subscribe",
        "/s/{token}/",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }
}

#[test]
fn openapi_declares_bearer_auth() {
    let spec = api::openapi();
    let components = spec.components.unwrap();
    assert!(components.security_schemes.contains_key("bearer_auth"));
    assert!(components.schemas.contains_key("RecipeResponse"));
}
