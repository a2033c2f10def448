//! Shared harness for the HTTP integration tests: a router over the in-memory
//! store and a small request helper.

#![allow(dead_code)]

use api_lib::{
    adapters::InMemoryDatabase,
    config::Config,
    web::{build_router, state::AppState},
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const DOMAIN: &str = "institution.edu";
pub const ADMIN_TOKEN: &str = "admin-secret";

pub fn test_config(admin_token: Option<&str>) -> Config {
    let admin_token = admin_token.map(str::to_string);
    Config::from_lookup(move |key: &str| match key {
        "JWT_SECRET" => Some("integration-test-secret".to_string()),
        "INSTITUTION_EMAIL_DOMAIN" => Some(DOMAIN.to_string()),
        "ADMIN_TOKEN" => admin_token.clone(),
        _ => None,
    })
    .unwrap()
}

/// A fresh application with an empty store and no admin token.
pub fn test_app() -> Router {
    app_with_config(test_config(None))
}

pub fn app_with_config(config: Config) -> Router {
    let state = AppState::new(Arc::new(InMemoryDatabase::new()), Arc::new(config));
    build_router(Arc::new(state))
}

pub struct TestRequest {
    method: Method,
    uri: String,
    token: Option<String>,
    headers: Vec<(&'static str, String)>,
    body: Option<Value>,
}

impl TestRequest {
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            token: None,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn put(uri: &str) -> Self {
        Self::new(Method::PUT, uri)
    }

    pub fn delete(uri: &str) -> Self {
        Self::new(Method::DELETE, uri)
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sends the request and returns the status with the decoded JSON body
    /// (`Value::Null` for an empty body).
    pub async fn send(self, app: &Router) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(token) = &self.token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        for (name, value) in &self.headers {
            builder = builder.header(*name, value);
        }
        let body = match self.body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }
}

/// Registers `local@institution.edu` with password `p1` and returns its token.
pub async fn signup(app: &Router, local: &str) -> String {
    let (status, body) = TestRequest::post("/api/auth/signup")
        .json(json!({
            "full_name": format!("{} Student", local),
            "email": format!("{}@{}", local, DOMAIN),
            "phone": "902-555-0100",
            "password": "p1",
        }))
        .send(app)
        .await;
    assert_eq!(status, StatusCode::OK, "signup failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

pub fn detail(body: &Value) -> &str {
    body["detail"].as_str().unwrap_or_default()
}
