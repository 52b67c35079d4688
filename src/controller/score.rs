// src/controller/score.rs

use crate::models::{answer::AnswerMap, test::TestPaper};

/// Sums the marks of every question whose selected option is one of its
/// correct options. Unanswered questions score zero.
///
/// The result is sent to the backend as-is when the session ends; the backend
/// does not re-grade it.
pub fn calculate_score(paper: &TestPaper, answers: &AnswerMap) -> u32 {
    paper
        .questions
        .iter()
        .filter(|q| {
            answers
                .selected(q.id)
                .is_some_and(|selected| q.correct_option_ids.contains(&selected))
        })
        .map(|q| q.marks)
        .sum()
}
