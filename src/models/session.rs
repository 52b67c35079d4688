// src/models/session.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backend-owned session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Pending,
    InProgress,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "PENDING",
            SessionStatus::InProgress => "IN_PROGRESS",
            SessionStatus::Completed => "COMPLETED",
        }
    }
}

/// One user's timed attempt at one test.
/// The client caches it at load time and never mutates it except through submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub test_id: i64,
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl Session {
    /// Whole seconds remaining until `end_time`, floored and clamped at zero.
    pub fn seconds_left(&self, now: DateTime<Utc>) -> u64 {
        let remaining_ms = (self.end_time - now).num_milliseconds();
        if remaining_ms <= 0 {
            0
        } else {
            (remaining_ms / 1000) as u64
        }
    }
}

/// Body of `POST /api/sessions/update-status`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub user_id: i64,
    pub test_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusResponse {
    pub session: Session,
}

/// Response of `GET /api/sessions/check-assignment/{testId}`.
/// The backend signals a refusal through the `error` field.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AssignmentCheck {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /api/sessions/end/{sessionId}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndSessionRequest {
    pub score: u32,
}
