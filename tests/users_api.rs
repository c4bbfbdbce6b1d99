// tests/users_api.rs
mod common;

use axum::http::{Method, StatusCode};
use common::{error_code, TestApp};
use serde_json::json;

#[tokio::test]
async fn health_check_responds_ok() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn registering_a_student_assigns_a_scan_code() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post(
            "/api/users",
            json!({ "email": "  Ana@School.Example ", "fullName": "Ana Lima", "role": "student" }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "ana@school.example");
    assert_eq!(body["role"], "student");
    assert!(body["qrCode"].as_str().is_some_and(|c| c.starts_with("QR-")));
}

#[tokio::test]
async fn teachers_are_registered_without_a_code() {
    let app = TestApp::new().await;
    let (_, body) = app
        .post("/api/users", json!({ "email": "t@school.example", "fullName": "Tom", "role": "teacher" }))
        .await;
    assert!(body["qrCode"].is_null());
}

#[tokio::test]
async fn user_validation_errors_use_the_error_body() {
    let app = TestApp::new().await;

    let (status, body) = app.post("/api/users", json!({ "fullName": "No Email", "role": "student" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "MISSING_EMAIL");
    assert!(body["error"].is_string());

    let (_, body) = app
        .post("/api/users", json!({ "email": "not-an-email", "fullName": "X", "role": "student" }))
        .await;
    assert_eq!(error_code(&body), "INVALID_EMAIL_FORMAT");

    let (_, body) = app
        .post("/api/users", json!({ "email": "x@school.example", "fullName": "X", "role": "janitor" }))
        .await;
    assert_eq!(error_code(&body), "INVALID_ROLE");

    let (_, body) = app
        .post("/api/users", json!({ "email": "x@school.example", "fullName": "   ", "role": "student" }))
        .await;
    assert_eq!(error_code(&body), "MISSING_FULL_NAME");
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = TestApp::new().await;
    app.user("dup@school.example", "First", "teacher").await;

    let (status, body) = app
        .post("/api/users", json!({ "email": "DUP@school.example", "fullName": "Second", "role": "teacher" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "EMAIL_EXISTS");
}

#[tokio::test]
async fn malformed_json_is_a_client_error() {
    let app = TestApp::new().await;
    let (status, bytes) = app.raw(Method::POST, "/api/users", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json error body");
    assert_eq!(error_code(&body), "INVALID_JSON");
}

#[tokio::test]
async fn users_are_listed_with_pagination_and_found_by_clerk_id() {
    let app = TestApp::new().await;
    app.user("a@school.example", "Alice", "student").await;
    app.user("b@school.example", "Bruno", "teacher").await;
    let (_, created) = app
        .post(
            "/api/users",
            json!({ "email": "c@school.example", "fullName": "Carla", "role": "principal", "clerkId": "user_42" }),
        )
        .await;

    let (status, body) = app.get("/api/users?limit=2&role=student").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["pagination"]["limit"], 2);
    assert_eq!(body["data"][0]["fullName"], "Alice");

    let (_, body) = app.get("/api/users?search=bru").await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, body) = app.get("/api/users?clerkId=user_42").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], created["id"]);

    let (status, body) = app.get("/api/users?clerkId=missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "USER_NOT_FOUND");
}

#[tokio::test]
async fn users_can_be_updated_and_deleted() {
    let app = TestApp::new().await;
    let id = app.user("u@school.example", "Old Name", "teacher").await;

    let (status, body) = app.put(&format!("/api/users/{}", id), json!({ "fullName": "New Name" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fullName"], "New Name");
    assert_eq!(body["email"], "u@school.example");

    let (status, body) = app.delete(&format!("/api/users/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], id);

    let (status, body) = app.get(&format!("/api/users/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "USER_NOT_FOUND");

    let (status, body) = app.get("/api/users/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_ID");
}

#[tokio::test]
async fn qr_code_endpoints_render_svg_and_html() {
    let app = TestApp::new().await;
    let student = app.user("s@school.example", "Sofia", "student").await;
    let teacher = app.user("t@school.example", "Tom", "teacher").await;

    let (status, bytes) = app.raw(Method::GET, &format!("/api/users/{}/qr-code", student), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&bytes).contains("<svg"));

    let (status, bytes) = app.raw(Method::GET, &format!("/students/{}/qr-code", student), None).await;
    assert_eq!(status, StatusCode::OK);
    let page = String::from_utf8_lossy(&bytes);
    assert!(page.contains("Sofia"));
    assert!(page.contains("<svg"));

    let (status, body) = app.get(&format!("/api/users/{}/qr-code", teacher)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_STUDENT_ROLE");
}
