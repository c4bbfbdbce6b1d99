// tests/school_api.rs
mod common;

use axum::http::StatusCode;
use common::{error_code, TestApp};
use serde_json::json;

#[tokio::test]
async fn classes_embed_their_teacher() {
    let app = TestApp::new().await;
    let teacher = app.user("t@school.example", "Tereza", "teacher").await;
    let student = app.user("s@school.example", "Samuel", "student").await;
    let class = app.class("5A", 5, Some(teacher)).await;

    let (status, body) = app.get(&format!("/api/classes/{}", class)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "5A");
    assert_eq!(body["teacher"]["fullName"], "Tereza");

    let (_, body) = app
        .post("/api/classes", json!({ "name": "5B", "gradeLevel": 5, "teacherId": student }))
        .await;
    assert_eq!(error_code(&body), "INVALID_TEACHER");

    let (_, body) = app.put(&format!("/api/classes/{}", class), json!({})).await;
    assert_eq!(error_code(&body), "NO_UPDATES");

    let (status, body) = app.get("/api/classes/4242").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "CLASS_NOT_FOUND");
}

#[tokio::test]
async fn students_are_enrolled_at_most_once() {
    let app = TestApp::new().await;
    let student = app.user("s@school.example", "Samuel", "student").await;
    let class = app.class("6A", 6, None).await;

    let (status, body) = app
        .post("/api/student-classes", json!({ "studentId": student, "classId": class }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let enrollment = body["id"].as_i64().expect("enrollment id");

    let (status, body) = app
        .post("/api/student-classes", json!({ "studentId": student, "classId": class }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "DUPLICATE_ENROLLMENT");

    let (_, body) = app.get(&format!("/api/student-classes?classId={}", class)).await;
    assert_eq!(body[0]["studentName"], "Samuel");
    assert_eq!(body[0]["className"], "6A");

    let (status, _) = app.delete(&format!("/api/student-classes/{}", enrollment)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/api/student-classes/{}", enrollment)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_reports_stats_for_each_role() {
    let app = TestApp::new().await;
    let principal = app.user("p@school.example", "Paula", "principal").await;
    let teacher = app.user("t@school.example", "Tereza", "teacher").await;
    let student = app.user("s@school.example", "Samuel", "student").await;
    let class = app.class("7A", 7, Some(teacher)).await;
    let (status, _) = app
        .post("/api/student-classes", json!({ "studentId": student, "classId": class }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.get(&format!("/api/dashboard?userId={}", principal)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "principal");
    assert_eq!(body["totalStudents"], 1);
    assert_eq!(body["totalTeachers"], 1);
    assert_eq!(body["totalClasses"], 1);

    let (_, body) = app.get(&format!("/api/dashboard?userId={}", teacher)).await;
    assert_eq!(body["role"], "teacher");
    assert_eq!(body["myClasses"], 1);
    assert_eq!(body["totalStudents"], 1);

    let (_, body) = app.get(&format!("/api/dashboard?userId={}", student)).await;
    assert_eq!(body["role"], "student");
    assert_eq!(body["myClasses"], 1);
    assert_eq!(body["attendanceRate"], 0);

    let (status, body) = app.get("/api/dashboard").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "MISSING_USER");

    let (status, body) = app.get("/api/dashboard?clerkId=nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "USER_NOT_FOUND");
}

#[tokio::test]
async fn subjects_check_their_class_and_teacher() {
    let app = TestApp::new().await;
    let teacher = app.user("t@school.example", "Tereza", "teacher").await;
    let student = app.user("s@school.example", "Samuel", "student").await;
    let class = app.class("5A", 5, Some(teacher)).await;

    let (status, body) = app
        .post(
            "/api/subjects",
            json!({ "name": "Biology", "description": "Cells and plants", "classId": class, "teacherId": teacher }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["classId"], class);
    let subject = body["id"].as_i64().expect("subject id");

    let (_, body) = app.post("/api/subjects", json!({ "name": "Art", "classId": 9999 })).await;
    assert_eq!(error_code(&body), "CLASS_NOT_FOUND");

    let (_, body) = app.post("/api/subjects", json!({ "name": "Art", "teacherId": student })).await;
    assert_eq!(error_code(&body), "INVALID_TEACHER");

    let (_, body) = app.post("/api/subjects", json!({ "name": "  " })).await;
    assert_eq!(error_code(&body), "MISSING_NAME");

    let (_, body) = app.get("/api/subjects?search=plants").await;
    assert_eq!(body[0]["id"], subject);

    let (status, body) = app.delete(&format!("/api/subjects/{}", subject)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"]["name"], "Biology");
    let (status, body) = app.get(&format!("/api/subjects/{}", subject)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "SUBJECT_NOT_FOUND");
}

#[tokio::test]
async fn assignments_validate_points_due_date_and_teacher() {
    let app = TestApp::new().await;
    let teacher = app.user("t@school.example", "Tereza", "teacher").await;
    let student = app.user("s@school.example", "Samuel", "student").await;
    let (_, subject) = app.post("/api/subjects", json!({ "name": "History" })).await;
    let subject = subject["id"].as_i64().expect("subject id");

    let assignment = |extra: serde_json::Value| {
        let mut body = json!({
            "title": "Essay",
            "subjectId": subject,
            "teacherId": teacher,
            "dueDate": "2024-05-01",
            "totalPoints": 100,
        });
        if let (Some(base), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        body
    };

    let (status, body) = app.post("/api/assignments", assignment(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["dueDate"], "2024-05-01T00:00:00.000Z");
    let id = body["id"].as_i64().expect("assignment id");

    let (_, body) = app
        .post("/api/assignments", assignment(json!({ "dueDate": "2024-05-01T10:30:00+02:00" })))
        .await;
    assert_eq!(body["dueDate"], "2024-05-01T08:30:00.000Z");

    let (_, body) = app.post("/api/assignments", assignment(json!({ "dueDate": "soon" }))).await;
    assert_eq!(error_code(&body), "INVALID_DUE_DATE");

    let (_, body) = app.post("/api/assignments", assignment(json!({ "totalPoints": 0 }))).await;
    assert_eq!(error_code(&body), "INVALID_TOTAL_POINTS");

    let (_, body) = app.post("/api/assignments", assignment(json!({ "teacherId": 9999 }))).await;
    assert_eq!(error_code(&body), "TEACHER_NOT_FOUND");

    let (_, body) = app.post("/api/assignments", assignment(json!({ "teacherId": student }))).await;
    assert_eq!(error_code(&body), "INVALID_TEACHER_ROLE");

    let (_, body) = app.post("/api/assignments", assignment(json!({ "subjectId": 9999 }))).await;
    assert_eq!(error_code(&body), "SUBJECT_NOT_FOUND");

    let (_, body) = app.put(&format!("/api/assignments/{}", id), json!({})).await;
    assert_eq!(error_code(&body), "NO_UPDATES");

    let (status, body) = app.put(&format!("/api/assignments/{}", id), json!({ "totalPoints": 50 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalPoints"], 50);

    let (_, body) = app.get("/api/assignments?subjectId=abc").await;
    assert_eq!(error_code(&body), "INVALID_SUBJECT_ID");
}

#[tokio::test]
async fn grading_a_submission_stamps_graded_at() {
    let app = TestApp::new().await;
    let teacher = app.user("t@school.example", "Tereza", "teacher").await;
    let student = app.user("s@school.example", "Samuel", "student").await;
    let (_, assignment) = app
        .post(
            "/api/assignments",
            json!({ "title": "Essay", "teacherId": teacher, "dueDate": "2024-05-01", "totalPoints": 100 }),
        )
        .await;
    let assignment = assignment["id"].as_i64().expect("assignment id");

    let (_, body) = app
        .post("/api/submissions", json!({ "assignmentId": assignment, "studentId": student }))
        .await;
    assert_eq!(error_code(&body), "MISSING_SUBMISSION_DATA");

    let (_, body) = app
        .post("/api/submissions", json!({ "assignmentId": 9999, "studentId": student, "content": "x" }))
        .await;
    assert_eq!(error_code(&body), "ASSIGNMENT_NOT_FOUND");

    let (_, body) = app
        .post("/api/submissions", json!({ "assignmentId": assignment, "studentId": teacher, "content": "x" }))
        .await;
    assert_eq!(error_code(&body), "INVALID_STUDENT_ROLE");

    let (status, body) = app
        .post("/api/submissions", json!({ "assignmentId": assignment, "studentId": student, "content": "My essay" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["gradedAt"].is_null());
    let submission = body["id"].as_i64().expect("submission id");

    let (_, body) = app.put(&format!("/api/submissions/{}", submission), json!({ "grade": -1 })).await;
    assert_eq!(error_code(&body), "INVALID_GRADE");

    let (status, body) = app
        .put(&format!("/api/submissions/{}", submission), json!({ "grade": 87, "feedback": "Good" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["grade"], 87);
    assert!(body["gradedAt"].is_string());

    let (_, body) = app.get(&format!("/api/dashboard?userId={}", teacher)).await;
    assert_eq!(body["pendingGrading"], 0);
    assert_eq!(body["myAssignments"], 1);
}

#[tokio::test]
async fn announcements_target_a_known_audience() {
    let app = TestApp::new().await;
    let principal = app.user("p@school.example", "Paula", "principal").await;
    let class = app.class("3C", 3, None).await;

    let (status, body) = app
        .post(
            "/api/announcements",
            json!({ "title": "Trip", "content": "Museum on Friday", "targetAudience": class.to_string(), "authorId": principal }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["classId"], class);
    assert_eq!(body["targetAudience"], class.to_string());

    let (status, _) = app
        .post("/api/announcements", json!({ "title": "Hi", "content": "Welcome", "targetAudience": "all" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app
        .post("/api/announcements", json!({ "title": "Hi", "content": "x", "targetAudience": "9999" }))
        .await;
    assert_eq!(error_code(&body), "CLASS_NOT_FOUND");

    let (_, body) = app
        .post("/api/announcements", json!({ "title": "Hi", "content": "x", "targetAudience": "everyone" }))
        .await;
    assert_eq!(error_code(&body), "INVALID_TARGET_AUDIENCE");

    let (_, body) = app
        .post("/api/announcements", json!({ "title": "Hi", "content": "x", "targetAudience": "all", "authorId": 9999 }))
        .await;
    assert_eq!(error_code(&body), "AUTHOR_NOT_FOUND");

    let (_, body) = app.post("/api/announcements", json!({ "title": "Hi", "content": "x" })).await;
    assert_eq!(error_code(&body), "MISSING_TARGET_AUDIENCE");

    let (_, body) = app.get(&format!("/api/announcements?classId={}", class)).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["title"], "Trip");
}
