// src/models/dashboard.rs
use serde::Serialize;

/// Dashboard statistics, tagged by the role of the requesting user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum DashboardStats {
    Principal(PrincipalStats),
    Teacher(TeacherStats),
    Student(StudentStats),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalStats {
    pub total_students: i64,
    pub total_teachers: i64,
    pub total_classes: i64,
    pub present_today: i64,
    pub marked_today: i64,
    pub attendance_rate: i64, // percent, rounded
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherStats {
    pub teacher_id: i64,
    pub my_classes: i64,
    pub my_assignments: i64,
    pub total_students: i64,
    pub pending_grading: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStats {
    pub student_id: i64,
    pub my_classes: i64,
    pub total_assignments: i64,
    pub submitted_count: i64,
    pub attendance_rate: i64, // percent, rounded
}

/// Rounded percentage; 0 when there is nothing to count.
pub fn percentage(part: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_and_handles_empty_totals() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(5, 5), 100);
    }
}
