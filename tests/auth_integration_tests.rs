mod common;

use chrono::Duration;
use common::spawn_app;
use reqwest::{Method, StatusCode, header};
use serde_json::{Value, json};
use super_gamer::{TokenService, models::Item};
use uuid::Uuid;

/// Every route that requires a bearer token, with a body valid for it.
fn protected_routes(item: &Item) -> Vec<(Method, String, Option<Value>)> {
    let item_path = format!("/items/{}", item.id);
    vec![
        (Method::GET, "/auth/me".to_string(), None),
        (
            Method::POST,
            "/comments".to_string(),
            Some(json!({ "item_id": item.id, "category": "games", "text": "hi" })),
        ),
        (
            Method::POST,
            "/items".to_string(),
            Some(json!({
                "title": "t", "description": "d", "image_url": "i",
                "official_link": "o", "category": "games"
            })),
        ),
        (Method::PUT, item_path.clone(), Some(json!({ "title": "new" }))),
        (Method::DELETE, item_path, None),
    ]
}

async fn send(
    app: &common::TestApp,
    method: Method,
    path: &str,
    body: Option<Value>,
    authorization: Option<&str>,
) -> reqwest::Response {
    let mut request = app.client.request(method, app.url(path));
    if let Some(value) = authorization {
        request = request.header(header::AUTHORIZATION, value);
    }
    if let Some(body) = body {
        request = request.json(&body);
    }
    request.send().await.expect("request failed")
}

#[tokio::test]
async fn test_expired_token_is_rejected_everywhere() {
    let app = spawn_app().await;
    let item = app.seed_item("Metroid", "games").await;

    // An admin token, so only expiry can explain the refusal.
    let admin = app
        .state
        .repo
        .find_user_by_email(common::ADMIN_EMAIL)
        .await
        .unwrap()
        .unwrap();
    let expired = app.state.tokens.issue(admin.id, Duration::hours(-1)).unwrap();
    let authorization = format!("Bearer {expired}");

    for (method, path, body) in protected_routes(&item) {
        let response = send(&app, method.clone(), &path, body, Some(&authorization)).await;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{method} {path} accepted an expired token"
        );
        let error: Value = response.json().await.unwrap();
        assert_eq!(error["detail"], "Token expired");
    }

    // Nothing was deleted by the refused calls.
    assert!(app.state.repo.find_item(item.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_missing_token_is_rejected_everywhere() {
    let app = spawn_app().await;
    let item = app.seed_item("Samus", "games").await;

    for (method, path, body) in protected_routes(&item) {
        let response = send(&app, method.clone(), &path, body, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {path}");
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}

#[tokio::test]
async fn test_token_signed_with_another_secret_is_invalid() {
    let app = spawn_app().await;
    let forged = TokenService::new("attacker-secret", Duration::hours(1))
        .issue_session(Uuid::new_v4())
        .unwrap();

    let response = send(
        &app,
        Method::GET,
        "/auth/me",
        None,
        Some(&format!("Bearer {forged}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["detail"], "Could not validate token");
}

#[tokio::test]
async fn test_valid_token_for_unknown_user_is_rejected() {
    let app = spawn_app().await;
    let orphan = app.state.tokens.issue_session(Uuid::new_v4()).unwrap();

    let response = send(
        &app,
        Method::GET,
        "/auth/me",
        None,
        Some(&format!("Bearer {orphan}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_bearer_scheme_is_rejected() {
    let app = spawn_app().await;
    let token = app.user_token("scheme@site.io").await;

    let response = send(
        &app,
        Method::GET,
        "/auth/me",
        None,
        Some(&format!("Basic {token}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_item_mutations_are_forbidden_for_users() {
    let app = spawn_app().await;
    let item = app.seed_item("Kirby", "heroes").await;
    let token = app.user_token("pink@site.io").await;
    let authorization = format!("Bearer {token}");

    let update = send(
        &app,
        Method::PUT,
        &format!("/items/{}", item.id),
        Some(json!({ "title": "Meta Knight" })),
        Some(&authorization),
    )
    .await;
    assert_eq!(update.status(), StatusCode::FORBIDDEN);

    let delete = send(
        &app,
        Method::DELETE,
        &format!("/items/{}", item.id),
        None,
        Some(&authorization),
    )
    .await;
    assert_eq!(delete.status(), StatusCode::FORBIDDEN);

    let stored = app.state.repo.find_item(item.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Kirby");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = spawn_app().await;
    let response = app.client.get(app.url("/health")).send().await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
