// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

pub const TOKEN: &str = "test_bearer_token";
pub const TEST_ID: i64 = 4;
pub const USER_ID: i64 = 3;
pub const SESSION_ID: i64 = 77;

/// What the mock backend answers and what it has been asked.
pub struct MockState {
    pub session_status: &'static str,
    pub seconds_left: i64,
    /// `(status, message)`; a 200 status puts the message in the body's `error` field.
    pub assignment_error: Option<(u16, String)>,
    pub answer_failures: u32,
    pub requests: Vec<String>,
    pub answers: Vec<Value>,
    pub scores: Vec<u32>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            session_status: "IN_PROGRESS",
            seconds_left: 600,
            assignment_error: None,
            answer_failures: 0,
            requests: Vec::new(),
            answers: Vec::new(),
            scores: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn configure(&self, change: impl FnOnce(&mut MockState)) {
        change(&mut self.inner.lock().unwrap());
    }

    pub fn requests(&self) -> Vec<String> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn answers(&self) -> Vec<Value> {
        self.inner.lock().unwrap().answers.clone()
    }

    pub fn scores(&self) -> Vec<u32> {
        self.inner.lock().unwrap().scores.clone()
    }

    /// Records the request; rejects it unless it carries the expected bearer token.
    fn admit(&self, headers: &HeaderMap, line: String) -> Result<(), Response> {
        self.inner.lock().unwrap().requests.push(line);
        let expected = format!("Bearer {}", TOKEN);
        let authorized = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .is_some_and(|h| h == expected);
        if authorized {
            Ok(())
        } else {
            Err(error(StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

pub fn test_payload() -> Value {
    json!({
        "TestID": TEST_ID,
        "Title": "Rust Basics",
        "Description": "Ownership <em>and</em> borrowing",
        "Duration": 600,
        "TotalMarks": 8,
        "Questions": [
            {"question": {"id": 1, "questionText": "Which keyword moves captures?", "marks": 5,
                "options": [{"option": {"id": 10, "optionText": "move"}},
                            {"option": {"id": 11, "optionText": "ref"}}],
                "correctOption": [{"optionId": 10}]}},
            {"question": {"id": 2, "questionText": "Pick a smart pointer", "marks": 3,
                "options": [{"option": {"id": 21, "optionText": "Box"}},
                            {"option": {"id": 22, "optionText": "Rc"}},
                            {"option": {"id": 99, "optionText": "u8"}}],
                "correctOption": [{"optionId": 21}, {"optionId": 22}]}}
        ]
    })
}

async fn check_assignment(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(test_id): Path<i64>,
) -> Response {
    if let Err(rejection) = backend.admit(&headers, format!("GET check-assignment/{}", test_id)) {
        return rejection;
    }
    let assignment_error = backend.inner.lock().unwrap().assignment_error.clone();
    match assignment_error {
        None => Json(json!({ "message": "Test is assigned" })).into_response(),
        Some((200, message)) => Json(json!({ "error": message })).into_response(),
        Some((status, message)) => error(
            StatusCode::from_u16(status).unwrap_or(StatusCode::FORBIDDEN),
            &message,
        ),
    }
}

async fn get_test(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(test_id): Path<i64>,
) -> Response {
    if let Err(rejection) = backend.admit(&headers, format!("GET get-test/{}", test_id)) {
        return rejection;
    }
    if test_id != TEST_ID {
        return error(StatusCode::NOT_FOUND, "Test not found");
    }
    Json(test_payload()).into_response()
}

async fn update_status(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = backend.admit(&headers, "POST update-status".to_string()) {
        return rejection;
    }
    let state = backend.inner.lock().unwrap();
    let now = Utc::now();
    Json(json!({
        "session": {
            "id": SESSION_ID,
            "userId": body["userId"],
            "testId": body["testId"],
            "status": state.session_status,
            "startTime": (now - Duration::minutes(5)).to_rfc3339(),
            "endTime": (now + Duration::seconds(state.seconds_left)).to_rfc3339(),
        }
    }))
    .into_response()
}

async fn submit_answers(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(session_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = backend.admit(&headers, format!("POST answers/{}", session_id)) {
        return rejection;
    }
    let mut state = backend.inner.lock().unwrap();
    if state.answer_failures > 0 {
        state.answer_failures -= 1;
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }
    state.answers.push(body);
    Json(json!({ "message": "Answers saved" })).into_response()
}

async fn end_session(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(session_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = backend.admit(&headers, format!("POST end/{}", session_id)) {
        return rejection;
    }
    let mut state = backend.inner.lock().unwrap();
    let Some(score) = body["score"].as_u64() else {
        return error(StatusCode::BAD_REQUEST, "score is required");
    };
    state.scores.push(score as u32);
    state.session_status = "COMPLETED";
    Json(json!({ "message": "Session ended" })).into_response()
}

async fn summary(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path((test_id, user_id)): Path<(i64, i64)>,
) -> Response {
    if let Err(rejection) = backend.admit(&headers, format!("GET summary/{}/{}", test_id, user_id))
    {
        return rejection;
    }
    let state = backend.inner.lock().unwrap();
    let chosen = |question_id: i64| -> Option<i64> {
        state.answers.last()?["answers"]
            .as_array()?
            .iter()
            .find(|a| a["questionId"].as_i64() == Some(question_id))?["selectedOptionId"]
            .as_i64()
    };
    let option = |id: Option<i64>, texts: &[(i64, &str)]| -> Value {
        id.and_then(|id| texts.iter().find(|(o, _)| *o == id))
            .map(|(id, text)| json!({ "id": id, "optionText": text }))
            .unwrap_or(Value::Null)
    };

    let q1: &[(i64, &str)] = &[(10, "move"), (11, "ref")];
    let q2: &[(i64, &str)] = &[(21, "Box"), (22, "Rc"), (99, "u8")];
    let options = |texts: &[(i64, &str)]| -> Vec<Value> {
        texts
            .iter()
            .map(|(id, text)| json!({ "id": id, "optionText": text }))
            .collect()
    };

    Json(json!({
        "testTitle": "Rust Basics",
        "testDescription": "Ownership <em>and</em> borrowing",
        "totalMarks": 8,
        "questions": [
            {"questionId": 1, "questionText": "Which keyword moves captures?", "marks": 5,
             "options": options(q1), "correctOption": option(Some(10), q1),
             "chosenOption": option(chosen(1), q1)},
            {"questionId": 2, "questionText": "Pick a smart pointer", "marks": 3,
             "options": options(q2), "correctOption": option(Some(21), q2),
             "chosenOption": option(chosen(2), q2)}
        ]
    }))
    .into_response()
}

/// Spawns the mock backend on a random port.
/// Returns the base URL (e.g., "http://127.0.0.1:12345") and a handle to its state.
pub async fn spawn_app() -> (String, MockBackend) {
    let backend = MockBackend::default();

    let app = Router::new()
        .route("/api/sessions/check-assignment/{test_id}", get(check_assignment))
        .route("/api/tests/get-test/{test_id}", get(get_test))
        .route("/api/sessions/update-status", post(update_status))
        .route("/api/sessions/session/{session_id}/answers", post(submit_answers))
        .route("/api/sessions/end/{session_id}", post(end_session))
        .route("/api/tests/{test_id}/user/{user_id}/summary", get(summary))
        .layer(TraceLayer::new_for_http())
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, backend)
}
