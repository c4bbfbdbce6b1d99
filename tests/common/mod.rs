// tests/common/mod.rs
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use schoolhub::{db, state::AppState, web::routes::create_router};
use serde_json::{json, Value};
use tower::ServiceExt;

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let pool = db::create_memory_pool().await.expect("in-memory database");
        let state = AppState::new(pool);
        let router = create_router(state.clone());
        TestApp { state, router }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.raw(method, uri, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, value)
    }

    pub async fn raw(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        (status, bytes.to_vec())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /// Creates a user and returns its id.
    pub async fn user(&self, email: &str, full_name: &str, role: &str) -> i64 {
        let (status, body) = self
            .post("/api/users", json!({ "email": email, "fullName": full_name, "role": role }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create user: {}", body);
        body["id"].as_i64().expect("user id")
    }

    /// Creates a class and returns its id.
    pub async fn class(&self, name: &str, grade_level: i64, teacher_id: Option<i64>) -> i64 {
        let (status, body) = self
            .post("/api/classes", json!({ "name": name, "gradeLevel": grade_level, "teacherId": teacher_id }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create class: {}", body);
        body["id"].as_i64().expect("class id")
    }
}

pub fn error_code(body: &Value) -> &str {
    body["code"].as_str().unwrap_or_default()
}
