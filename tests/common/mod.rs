//! Shared helpers for the HTTP integration tests.
#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use pantry::config::Config;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub state: Arc<pantry::api::AppState>,
    pub router: Router,
    pub media_root: PathBuf,
}

pub fn test_config() -> Config {
    let id = uuid::Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("pantry-test-{id}.db"));
    let media_root = std::env::temp_dir().join(format!("pantry-test-media-{id}"));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.media.media_root = media_root.display().to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.observability.metrics_enabled = false;
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let media_root = PathBuf::from(&config.media.media_root);

    let state = pantry::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");

    let router = pantry::api::router(state.clone());
    TestApp {
        state,
        router,
        media_root,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    /// Register an account and return its token.
    pub async fn user_with_token(&self, email: &str) -> String {
        let (status, _) = self
            .request(
                Method::POST,
                "/user/create",
                None,
                Some(json!({"email": email, "password": "testpass", "name": "Test name"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .request(
                Method::POST,
                "/user/token",
                None,
                Some(json!({"email": email, "password": "testpass"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    pub async fn create_tag(&self, token: &str, name: &str) -> i64 {
        let (status, body) = self
            .post("/recipe/tags", token, json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_i64().unwrap()
    }

    pub async fn create_ingredient(&self, token: &str, name: &str) -> i64 {
        let (status, body) = self
            .post("/recipe/ingredients", token, json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_i64().unwrap()
    }

    /// Create a recipe with default fields overridden by `fields`.
    pub async fn create_recipe(&self, token: &str, fields: Value) -> Value {
        let mut payload = json!({
            "title": "Sample recipe",
            "time_minutes": 10,
            "price": 5.00,
        });
        if let (Some(target), Some(extra)) = (payload.as_object_mut(), fields.as_object()) {
            for (k, v) in extra {
                target.insert(k.clone(), v.clone());
            }
        }

        let (status, body) = self.post("/recipe/recipes", token, payload).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }
}
