//! 测试公共模块
//! 提供内存存储的测试状态和请求辅助函数
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use std::sync::Arc;
use tower::ServiceExt;
use wardrobe_api::{
    config::{AppConfig, CorsConfig, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig},
    middleware::AppState,
    repository::{InMemoryUserStore, UserStore},
    routes,
};

pub const TEST_SECRET: &str =
    "integration-test-secret-long-enough-for-hs512-signing-0123456789abcdefghijklmnop";

/// 创建测试配置（内存存储，低成本 Argon2 参数）
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            graceful_shutdown_timeout_secs: 5,
        },
        database: DatabaseConfig {
            backend: "memory".to_string(),
            url: None,
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            jwt_secret: Secret::new(TEST_SECRET.to_string()),
            access_token_exp_minutes: 60,
            refresh_token_exp_days: 7,
            password_min_length: 8,
            password_require_uppercase: true,
            password_require_lowercase: true,
            password_require_digit: true,
            password_require_special: false,
            password_hash_memory_kib: 1024,
            password_hash_iterations: 1,
            password_hash_parallelism: 1,
        },
        cors: CorsConfig {
            allowed_origins: "http://localhost:3000,http://localhost:4200".to_string(),
        },
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub store: Arc<InMemoryUserStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(create_test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(InMemoryUserStore::new());
        let users: Arc<dyn UserStore> = store.clone();
        let state = Arc::new(AppState::new(config, users).expect("Failed to build app state"));
        Self { state, store }
    }

    pub fn router(&self) -> Router {
        routes::create_router(self.state.clone())
    }

    /// 发送 JSON 请求，返回状态码和响应体
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        (status, json)
    }

    /// 注册 johndoe 并返回令牌对响应
    pub async fn register_john(&self) -> serde_json::Value {
        let (status, body) = self
            .send("POST", "/api/auth/register", None, Some(john_registration()))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body
    }
}

pub fn john_registration() -> serde_json::Value {
    serde_json::json!({
        "username": "johndoe",
        "email": "john@example.com",
        "password": "SecurePassword123",
        "firstName": "John",
        "lastName": "Doe"
    })
}
