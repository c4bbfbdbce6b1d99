// src/scanner/session.rs
use crate::{
    error::{AppError, AppResult},
    models::attendance::{AttendanceEvent, AttendanceRecord, AttendanceStatus, MarkAttendance, StudentRef},
    services::attendance_service,
    state::AttendanceFeed,
};
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tokio::sync::mpsc;

/// Records attendance and pushes the result to the live feed.
pub async fn record_and_broadcast(
    db_pool: &SqlitePool,
    feed: &AttendanceFeed,
    mark: &MarkAttendance,
) -> AppResult<AttendanceRecord> {
    let record = attendance_service::mark_attendance(db_pool, mark).await?;
    let event = attendance_service::attendance_event(db_pool, record.clone()).await?;
    feed.publish(&event).await;
    Ok(record)
}

/// Fixed parameters of one scanning session at the classroom door.
#[derive(Debug, Clone)]
pub struct ScanSession {
    pub class_id: i64,
    pub date: NaiveDate,
    pub marked_by: Option<i64>,
}

#[derive(Debug)]
pub enum ScanOutcome {
    Recorded(AttendanceEvent),
    Rejected { payload: String, error: AppError },
}

/// Marks every scanned payload present for the session's class and date,
/// reporting each outcome. Runs until the payload stream ends or nobody
/// listens to outcomes anymore.
pub async fn run_scan_session(
    db_pool: SqlitePool,
    feed: AttendanceFeed,
    session: ScanSession,
    mut payloads: mpsc::Receiver<String>,
    outcomes: mpsc::Sender<ScanOutcome>,
) {
    tracing::info!("🎫 Scan session started for class {} on {}.", session.class_id, session.date);

    while let Some(payload) = payloads.recv().await {
        let mark = MarkAttendance {
            student: StudentRef::ScanCode(payload.clone()),
            class_id: session.class_id,
            date: session.date,
            status: AttendanceStatus::Present,
            marked_by: session.marked_by,
        };

        let outcome = match attendance_service::mark_attendance(&db_pool, &mark).await {
            Ok(record) => match attendance_service::attendance_event(&db_pool, record).await {
                Ok(event) => {
                    feed.publish(&event).await;
                    ScanOutcome::Recorded(event)
                }
                Err(error) => ScanOutcome::Rejected { payload, error },
            },
            Err(e) => {
                tracing::info!("Scan of {} rejected: {}", payload, e);
                ScanOutcome::Rejected { payload, error: e.into() }
            }
        };

        if outcomes.send(outcome).await.is_err() {
            break;
        }
    }

    tracing::info!("Scan session for class {} ended.", session.class_id);
}
