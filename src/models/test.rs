// src/models/test.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::utils::html::clean_html;

/// Test payload as returned by `GET /api/tests/get-test/{testId}`.
/// Field names follow the backend's table columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRecord {
    #[serde(rename = "TestID", default)]
    pub test_id: Option<i64>,

    #[serde(rename = "Title")]
    pub title: String,

    #[serde(rename = "Description", default)]
    pub description: String,

    /// Duration in seconds.
    #[serde(rename = "Duration", default)]
    pub duration: u32,

    #[serde(rename = "TotalMarks", default)]
    pub total_marks: u32,

    #[serde(rename = "Questions", default)]
    pub questions: Vec<TestQuestionLink>,
}

/// Join row between a test and one of its questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestQuestionLink {
    pub question: QuestionRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: i64,
    pub question_text: String,
    pub marks: u32,
    #[serde(default)]
    pub options: Vec<QuestionOptionLink>,
    /// Correct-option rows. Present in the pre-start payload (see DESIGN.md).
    #[serde(default)]
    pub correct_option: Vec<CorrectOptionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOptionLink {
    pub option: OptionRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionRecord {
    pub id: i64,
    pub option_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectOptionRecord {
    pub option_id: i64,
}

/// Immutable snapshot of a test, fetched once per session.
#[derive(Debug, Clone, PartialEq)]
pub struct TestPaper {
    pub title: String,
    pub description: String,
    pub duration_seconds: u32,
    pub total_marks: u32,
    pub questions: Vec<PaperQuestion>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaperQuestion {
    pub id: i64,
    pub text: String,
    pub marks: u32,
    pub options: Vec<PaperOption>,
    /// May hold more than one option id.
    pub correct_option_ids: BTreeSet<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaperOption {
    pub id: i64,
    pub text: String,
}

impl TestPaper {
    /// Sum of the marks of every question on the paper.
    pub fn question_marks(&self) -> u32 {
        self.questions.iter().map(|q| q.marks).sum()
    }

    /// True when `total_marks` matches the per-question marks.
    pub fn marks_reconciled(&self) -> bool {
        self.question_marks() == self.total_marks
    }

    pub fn question(&self, question_id: i64) -> Option<&PaperQuestion> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

impl PaperQuestion {
    pub fn has_option(&self, option_id: i64) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }
}

impl From<TestRecord> for TestPaper {
    fn from(record: TestRecord) -> Self {
        let questions = record
            .questions
            .into_iter()
            .map(|link| {
                let q = link.question;
                PaperQuestion {
                    id: q.id,
                    text: clean_html(&q.question_text),
                    marks: q.marks,
                    options: q
                        .options
                        .into_iter()
                        .map(|o| PaperOption {
                            id: o.option.id,
                            text: clean_html(&o.option.option_text),
                        })
                        .collect(),
                    correct_option_ids: q.correct_option.iter().map(|c| c.option_id).collect(),
                }
            })
            .collect();

        TestPaper {
            title: clean_html(&record.title),
            description: clean_html(&record.description),
            duration_seconds: record.duration,
            total_marks: record.total_marks,
            questions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW_TEST: &str = r#"{
        "TestID": 4,
        "Title": "Rust Basics",
        "Description": "Ownership and borrowing",
        "Duration": 1800,
        "TotalMarks": 8,
        "CreatedBy": 1,
        "Questions": [
            {
                "testId": 4,
                "questionId": 1,
                "question": {
                    "id": 1,
                    "questionText": "Which keyword moves a closure's captures?",
                    "marks": 5,
                    "options": [
                        {"questionId": 1, "optionId": 10, "option": {"id": 10, "optionText": "move"}},
                        {"questionId": 1, "optionId": 11, "option": {"id": 11, "optionText": "ref"}}
                    ],
                    "correctOption": [{"questionId": 1, "optionId": 10}]
                }
            },
            {
                "testId": 4,
                "questionId": 2,
                "question": {
                    "id": 2,
                    "questionText": "Pick a smart pointer",
                    "marks": 3,
                    "options": [
                        {"option": {"id": 21, "optionText": "Box"}},
                        {"option": {"id": 22, "optionText": "Rc"}},
                        {"option": {"id": 23, "optionText": "u8"}}
                    ],
                    "correctOption": [{"optionId": 21}, {"optionId": 22}]
                }
            }
        ]
    }"#;

    #[test]
    fn test_record_converts_to_paper() {
        let record: TestRecord = serde_json::from_str(RAW_TEST).unwrap();
        let paper = TestPaper::from(record);

        assert_eq!(paper.title, "Rust Basics");
        assert_eq!(paper.duration_seconds, 1800);
        assert_eq!(paper.questions.len(), 2);
        assert_eq!(paper.questions[0].options[0].text, "move");
        assert_eq!(
            paper.questions[1].correct_option_ids,
            BTreeSet::from([21, 22])
        );
        assert!(paper.questions[1].has_option(23));
        assert!(!paper.questions[1].has_option(10));
    }

    #[test]
    fn test_marks_reconciliation() {
        let record: TestRecord = serde_json::from_str(RAW_TEST).unwrap();
        let mut paper = TestPaper::from(record);
        assert!(paper.marks_reconciled());

        paper.total_marks = 10;
        assert!(!paper.marks_reconciled());
        assert_eq!(paper.question_marks(), 8);
    }

    #[test]
    fn test_question_text_is_sanitized() {
        let raw = r#"{
            "Title": "XSS",
            "Questions": [{"question": {
                "id": 1,
                "questionText": "<b>Bold</b><script>alert(1)</script>",
                "marks": 1
            }}]
        }"#;
        let paper = TestPaper::from(serde_json::from_str::<TestRecord>(raw).unwrap());
        assert_eq!(paper.questions[0].text, "<b>Bold</b>");
        assert!(paper.questions[0].correct_option_ids.is_empty());
    }
}
