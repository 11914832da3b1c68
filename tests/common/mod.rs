#![allow(dead_code)]

use reqwest::{Client, StatusCode};
use serde_json::json;
use std::sync::Arc;
use super_gamer::{
    AppConfig, AppState, InMemoryRepository, bootstrap, create_router,
    models::{Item, TokenResponse},
    repository::RepositoryState,
};
use tokio::net::TcpListener;

pub const ADMIN_EMAIL: &str = "admin@supergamer.com";
pub const ADMIN_PASSWORD: &str = "admin";

pub struct TestApp {
    pub address: String,
    pub state: AppState,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.address, path)
    }

    pub async fn register(&self, email: &str, name: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/register"))
            .json(&json!({ "email": email, "name": name, "password": password }))
            .send()
            .await
            .expect("register request failed")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed")
    }

    /// Registers a fresh `user`-role account and returns its token.
    pub async fn user_token(&self, email: &str) -> String {
        let response = self.register(email, "Player One", "secret-pass").await;
        assert_eq!(response.status(), StatusCode::OK);
        response.json::<TokenResponse>().await.unwrap().access_token
    }

    pub async fn admin_token(&self) -> String {
        let response = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
        response.json::<TokenResponse>().await.unwrap().access_token
    }

    pub async fn create_item(&self, token: &str, title: &str, category: &str) -> reqwest::Response {
        self.client
            .post(self.url("/items"))
            .bearer_auth(token)
            .json(&json!({
                "title": title,
                "description": format!("{title} description"),
                "image_url": "https://img.test/cover.png",
                "official_link": "https://official.test",
                "category": category,
            }))
            .send()
            .await
            .expect("create item request failed")
    }

    /// Creates an item as the bootstrap admin and returns it.
    pub async fn seed_item(&self, title: &str, category: &str) -> Item {
        let token = self.admin_token().await;
        let response = self.create_item(&token, title, category).await;
        assert_eq!(response.status(), StatusCode::OK);
        response.json::<Item>().await.unwrap()
    }

    pub async fn post_comment(
        &self,
        token: &str,
        item_id: &str,
        category: &str,
        text: &str,
    ) -> reqwest::Response {
        self.client
            .post(self.url("/comments"))
            .bearer_auth(token)
            .json(&json!({ "item_id": item_id, "category": category, "text": text }))
            .send()
            .await
            .expect("comment request failed")
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        // Minimum bcrypt cost keeps the suites fast.
        bcrypt_cost: 4,
        admin_password: ADMIN_PASSWORD.to_string(),
        ..AppConfig::default()
    }
}

/// Serves the real router on an ephemeral port, backed by a fresh in-memory
/// store with the bootstrap admin already created.
pub async fn spawn_app() -> TestApp {
    let repo = Arc::new(InMemoryRepository::new()) as RepositoryState;
    let state = AppState::new(repo, test_config());

    bootstrap::ensure_admin(&state.repo, &state.hasher, ADMIN_PASSWORD)
        .await
        .expect("failed to bootstrap admin");

    let router = create_router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        state,
        client: Client::new(),
    }
}
