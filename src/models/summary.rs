// src/models/summary.rs

use serde::{Deserialize, Serialize};

use super::test::OptionRecord;

/// Response of `GET /api/tests/{testId}/user/{userId}/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummaryRecord {
    pub test_title: String,
    #[serde(default)]
    pub test_description: String,
    pub total_marks: u32,
    #[serde(default)]
    pub questions: Vec<SummaryQuestionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuestionRecord {
    pub question_id: i64,
    pub question_text: String,
    pub marks: u32,
    #[serde(default)]
    pub options: Vec<OptionRecord>,
    /// `null` when no correct option was mapped for the question.
    #[serde(default)]
    pub correct_option: Option<OptionRecord>,
    /// `null` when the user did not answer.
    #[serde(default)]
    pub chosen_option: Option<OptionRecord>,
}
