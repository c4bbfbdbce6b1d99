// src/state.rs
use crate::models::attendance::AttendanceEvent;
use axum::extract::ws::Message;
use sqlx::SqlitePool;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    Mutex,
};
use uuid::Uuid;

// Sender half of one live-feed WebSocket connection
type WsTx = mpsc::Sender<Message>;

const CONNECTION_BUFFER: usize = 32;

/// Open live-feed connections, keyed by connection id.
#[derive(Debug, Clone, Default)]
pub struct AttendanceFeed {
    pub connections: Arc<Mutex<HashMap<Uuid, WsTx>>>,
}

impl AttendanceFeed {
    /// Registers a new connection and returns its id and message stream.
    pub async fn subscribe(&self) -> (Uuid, mpsc::Receiver<Message>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(CONNECTION_BUFFER);
        self.connections.lock().await.insert(conn_id, tx);
        (conn_id, rx)
    }

    pub async fn unsubscribe(&self, conn_id: &Uuid) {
        self.connections.lock().await.remove(conn_id);
    }

    /// Sends a text frame to every open connection without waiting on any of
    /// them. Connections that are closed or too far behind are dropped.
    pub async fn broadcast(&self, message_text: String) {
        let mut connections = self.connections.lock().await;
        let message = Message::Text(message_text.into());
        connections.retain(|conn_id, tx| match tx.try_send(message.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Feed client {} is not keeping up, dropping it.", conn_id);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        });
    }

    pub async fn publish(&self, event: &AttendanceEvent) {
        match serde_json::to_string(event) {
            Ok(text) => {
                tracing::debug!("-> Attendance feed broadcast: {}", event.message);
                self.broadcast(text).await;
            }
            Err(e) => tracing::error!("Failed to serialize attendance event: {:?}", e),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub attendance_feed: AttendanceFeed,
}

impl AppState {
    pub fn new(db_pool: SqlitePool) -> Self {
        AppState {
            db_pool,
            attendance_feed: AttendanceFeed::default(),
        }
    }
}

impl axum::extract::FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db_pool.clone()
    }
}

impl axum::extract::FromRef<AppState> for AttendanceFeed {
    fn from_ref(state: &AppState) -> AttendanceFeed {
        state.attendance_feed.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::AttendanceRecord;

    fn event(student_name: &str) -> AttendanceEvent {
        AttendanceEvent {
            record: AttendanceRecord {
                id: 1,
                student_id: Some(2),
                class_id: Some(3),
                date: "2024-03-05".into(),
                status: "present".into(),
                marked_by: None,
                created_at: "2024-03-05T08:00:00.000Z".into(),
            },
            student_name: student_name.into(),
            message: format!("{} marked present on 2024-03-05", student_name),
        }
    }

    #[tokio::test]
    async fn published_events_reach_every_subscriber() {
        let feed = AttendanceFeed::default();
        let (_, mut first) = feed.subscribe().await;
        let (second_id, mut second) = feed.subscribe().await;

        let event = event("Ana");
        feed.publish(&event).await;

        for rx in [&mut first, &mut second] {
            match rx.recv().await {
                Some(Message::Text(text)) => assert!(text.as_str().contains("\"studentName\":\"Ana\"")),
                other => panic!("unexpected message: {:?}", other),
            }
        }

        feed.unsubscribe(&second_id).await;
        assert_eq!(feed.connections.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn a_stalled_subscriber_does_not_block_publishing() {
        let feed = AttendanceFeed::default();
        let (_, _stalled) = feed.subscribe().await;
        let (_, mut live) = feed.subscribe().await;
        let event = event("Ana");

        for n in 0..(CONNECTION_BUFFER * 2) {
            tokio::time::timeout(std::time::Duration::from_secs(2), feed.publish(&event))
                .await
                .unwrap_or_else(|_| panic!("publish #{} blocked", n + 1));
            // Keep the second client drained
            assert!(live.recv().await.is_some());
        }

        // Only the client that kept up is still connected
        assert_eq!(feed.connections.lock().await.len(), 1);
        let (_, _late) = feed.subscribe().await;
        assert_eq!(feed.connections.lock().await.len(), 2);
    }
}
