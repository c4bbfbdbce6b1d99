// tests/attendance_api.rs
mod common;

use axum::{extract::ws::Message, http::StatusCode};
use common::{error_code, TestApp};
use serde_json::{json, Value};

struct Roster {
    teacher: i64,
    student: i64,
    class: i64,
}

async fn roster(app: &TestApp) -> Roster {
    let teacher = app.user("teacher@school.example", "Tereza", "teacher").await;
    let student = app.user("student@school.example", "Samuel", "student").await;
    let class = app.class("7A", 7, Some(teacher)).await;
    Roster { teacher, student, class }
}

#[tokio::test]
async fn attendance_is_recorded_once_per_student_class_and_day() {
    let app = TestApp::new().await;
    let r = roster(&app).await;
    let mark = json!({
        "studentId": r.student,
        "classId": r.class,
        "date": "2024-03-05",
        "status": "present",
        "markedBy": r.teacher,
    });

    let (status, body) = app.post("/api/attendance", mark.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["studentId"], r.student);
    assert_eq!(body["date"], "2024-03-05");
    assert_eq!(body["markedBy"], r.teacher);

    let (status, body) = app.post("/api/attendance", mark).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "DUPLICATE_ATTENDANCE");

    // Another day is a separate entry
    let (status, _) = app
        .post(
            "/api/attendance",
            json!({ "studentId": r.student, "classId": r.class, "date": "2024-03-06", "status": "late" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn recorder_checks_roles_and_references() {
    let app = TestApp::new().await;
    let r = roster(&app).await;
    let base = |student: Value, marked_by: Value| {
        json!({ "studentId": student, "classId": r.class, "date": "2024-03-05", "status": "present", "markedBy": marked_by })
    };

    let (_, body) = app.post("/api/attendance", base(json!(r.teacher), Value::Null)).await;
    assert_eq!(error_code(&body), "INVALID_STUDENT_ROLE");

    let (_, body) = app.post("/api/attendance", base(json!(9999), Value::Null)).await;
    assert_eq!(error_code(&body), "STUDENT_NOT_FOUND");

    let (_, body) = app.post("/api/attendance", base(json!(r.student), json!(r.student))).await;
    assert_eq!(error_code(&body), "INVALID_TEACHER_ROLE");

    let (_, body) = app.post("/api/attendance", base(json!(r.student), json!(9999))).await;
    assert_eq!(error_code(&body), "TEACHER_NOT_FOUND");

    let (_, body) = app
        .post(
            "/api/attendance",
            json!({ "studentId": r.student, "classId": 9999, "date": "2024-03-05", "status": "present" }),
        )
        .await;
    assert_eq!(error_code(&body), "CLASS_NOT_FOUND");
}

#[tokio::test]
async fn attendance_input_is_validated() {
    let app = TestApp::new().await;
    let r = roster(&app).await;

    let (status, body) = app
        .post("/api/attendance", json!({ "classId": r.class, "date": "2024-03-05", "status": "present" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "MISSING_STUDENT_ID");

    let (_, body) = app
        .post(
            "/api/attendance",
            json!({ "studentId": r.student, "classId": r.class, "date": "05/03/2024", "status": "present" }),
        )
        .await;
    assert_eq!(error_code(&body), "INVALID_DATE_FORMAT");

    let (_, body) = app
        .post(
            "/api/attendance",
            json!({ "studentId": r.student, "classId": r.class, "date": "2024-03-05", "status": "excused" }),
        )
        .await;
    assert_eq!(error_code(&body), "INVALID_STATUS");

    let (_, body) = app.get("/api/attendance?studentId=abc").await;
    assert_eq!(error_code(&body), "INVALID_STUDENT_ID");
}

#[tokio::test]
async fn attendance_can_be_filtered_updated_and_deleted() {
    let app = TestApp::new().await;
    let r = roster(&app).await;
    for (date, status) in [("2024-03-04", "present"), ("2024-03-05", "absent"), ("2024-03-06", "late")] {
        let (code, _) = app
            .post(
                "/api/attendance",
                json!({ "studentId": r.student, "classId": r.class, "date": date, "status": status }),
            )
            .await;
        assert_eq!(code, StatusCode::CREATED);
    }

    let (_, body) = app.get("/api/attendance?startDate=2024-03-05").await;
    let dates: Vec<&str> = body.as_array().expect("list").iter().filter_map(|r| r["date"].as_str()).collect();
    assert_eq!(dates, vec!["2024-03-06", "2024-03-05"]);

    let (_, body) = app.get("/api/attendance?status=absent").await;
    let absent_id = body[0]["id"].as_i64().expect("id");

    let (status, body) = app
        .put(&format!("/api/attendance/{}", absent_id), json!({ "status": "present", "markedBy": r.teacher }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "present");
    assert_eq!(body["markedBy"], r.teacher);

    let (status, body) = app.delete(&format!("/api/attendance/{}", absent_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attendance"]["id"], absent_id);

    let (status, body) = app.get(&format!("/api/attendance/{}", absent_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn recorded_attendance_is_pushed_to_the_live_feed() {
    let app = TestApp::new().await;
    let r = roster(&app).await;
    let (_, mut feed) = app.state.attendance_feed.subscribe().await;

    let (status, _) = app
        .post(
            "/api/attendance",
            json!({ "studentId": r.student, "classId": r.class, "date": "2024-03-05", "status": "present" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    match feed.recv().await {
        Some(Message::Text(text)) => {
            let event: Value = serde_json::from_str(text.as_str()).expect("event json");
            assert_eq!(event["studentName"], "Samuel");
            assert_eq!(event["record"]["classId"], r.class);
        }
        other => panic!("expected a text frame, got {:?}", other),
    }
}
