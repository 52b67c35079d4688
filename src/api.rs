// src/api.rs

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::{
    config::Config,
    error::AppError,
    models::{
        answer::SubmitAnswersRequest,
        session::{AssignmentCheck, EndSessionRequest, Session, UpdateStatusRequest, UpdateStatusResponse},
        summary::TestSummaryRecord,
        test::TestRecord,
    },
    routes,
};

/// Backend operations consumed by the exam client.
///
/// The controller only talks to this trait; `HttpExamApi` is the production
/// implementation and tests substitute in-memory fakes.
#[async_trait]
pub trait ExamApi: Send + Sync {
    async fn check_assignment(&self, test_id: i64) -> Result<AssignmentCheck, AppError>;

    async fn get_test(&self, test_id: i64) -> Result<TestRecord, AppError>;

    /// Lets the backend move the session along its schedule and returns it.
    async fn update_status(&self, user_id: i64, test_id: i64) -> Result<Session, AppError>;

    async fn submit_answers(
        &self,
        session_id: i64,
        answers: &SubmitAnswersRequest,
    ) -> Result<(), AppError>;

    async fn end_session(&self, session_id: i64, score: u32) -> Result<(), AppError>;

    async fn get_summary(&self, test_id: i64, user_id: i64) -> Result<TestSummaryRecord, AppError>;
}

/// JSON-over-HTTP client with bearer authentication.
#[derive(Debug, Clone)]
pub struct HttpExamApi {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpExamApi {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, AppError> {
        let parsed = Url::parse(base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "unsupported API scheme '{}'",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(&config.api_url, config.auth_token.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(&self.token)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(&self.token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AppError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw_body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&raw_body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

        tracing::debug!(status = status.as_u16(), %message, "backend returned an error status");

        Err(AppError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let response = self.send(request).await?;
        let raw_body = response.text().await?;
        Ok(serde_json::from_str(&raw_body)?)
    }
}

/// Pulls the `error` (or `message`) field out of an error body.
fn extract_error_message(raw_body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(raw_body).ok()?;
    parsed
        .get("error")
        .or_else(|| parsed.get("message"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

#[async_trait]
impl ExamApi for HttpExamApi {
    async fn check_assignment(&self, test_id: i64) -> Result<AssignmentCheck, AppError> {
        self.send_json(self.get(&routes::check_assignment(test_id))).await
    }

    async fn get_test(&self, test_id: i64) -> Result<TestRecord, AppError> {
        self.send_json(self.get(&routes::get_test(test_id))).await
    }

    async fn update_status(&self, user_id: i64, test_id: i64) -> Result<Session, AppError> {
        let body = UpdateStatusRequest { user_id, test_id };
        let response: UpdateStatusResponse = self
            .send_json(self.post(routes::UPDATE_STATUS).json(&body))
            .await?;
        Ok(response.session)
    }

    async fn submit_answers(
        &self,
        session_id: i64,
        answers: &SubmitAnswersRequest,
    ) -> Result<(), AppError> {
        self.send(self.post(&routes::submit_answers(session_id)).json(answers))
            .await?;
        Ok(())
    }

    async fn end_session(&self, session_id: i64, score: u32) -> Result<(), AppError> {
        let body = EndSessionRequest { score };
        self.send(self.post(&routes::end_session(session_id)).json(&body))
            .await?;
        Ok(())
    }

    async fn get_summary(&self, test_id: i64, user_id: i64) -> Result<TestSummaryRecord, AppError> {
        self.send_json(self.get(&routes::test_summary(test_id, user_id)))
            .await
    }
}
