// src/models/answer.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Selected option per question. One entry per answered question,
/// later selections overwrite earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerMap {
    selections: BTreeMap<i64, i64>,
}

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `option_id` for `question_id`, returning the replaced selection.
    pub fn select(&mut self, question_id: i64, option_id: i64) -> Option<i64> {
        self.selections.insert(question_id, option_id)
    }

    pub fn selected(&self, question_id: i64) -> Option<i64> {
        self.selections.get(&question_id).copied()
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.selections.iter().map(|(q, o)| (*q, *o))
    }

    /// Wire body for `POST /api/sessions/session/{sessionId}/answers`.
    pub fn to_request(&self) -> SubmitAnswersRequest {
        SubmitAnswersRequest {
            answers: self
                .iter()
                .map(|(question_id, selected_option_id)| AnswerPayload {
                    question_id,
                    selected_option_id,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPayload {
    pub question_id: i64,
    pub selected_option_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: Vec<AnswerPayload>,
}
