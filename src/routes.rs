// src/routes.rs

//! Backend endpoint table.
//!
//! Every path the client calls is assembled here so the controller and the
//! summary view never format URLs themselves.

pub fn check_assignment(test_id: i64) -> String {
    format!("/api/sessions/check-assignment/{}", test_id)
}

pub fn get_test(test_id: i64) -> String {
    format!("/api/tests/get-test/{}", test_id)
}

pub const UPDATE_STATUS: &str = "/api/sessions/update-status";

pub fn submit_answers(session_id: i64) -> String {
    format!("/api/sessions/session/{}/answers", session_id)
}

pub fn end_session(session_id: i64) -> String {
    format!("/api/sessions/end/{}", session_id)
}

pub fn test_summary(test_id: i64, user_id: i64) -> String {
    format!("/api/tests/{}/user/{}/summary", test_id, user_id)
}

/// Client-side views the controller navigates between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Home,
    Summary { test_id: i64, user_id: i64 },
}

impl View {
    pub fn path(&self) -> String {
        match self {
            View::Home => "/".to_string(),
            View::Summary { test_id, user_id } => {
                format!("/test/{}/user/{}/summary", test_id, user_id)
            }
        }
    }
}
