// src/summary.rs

//! Post-submission review. Read-only.

use crate::{
    api::ExamApi,
    error::AppError,
    models::{
        summary::{SummaryQuestionRecord, TestSummaryRecord},
        test::OptionRecord,
    },
    utils::html::{clean_html, strip_tags},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionHighlight {
    Correct,
    IncorrectChosen,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Wrong,
    Unanswered,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOption {
    pub id: i64,
    pub text: String,
    pub highlight: OptionHighlight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryQuestion {
    pub id: i64,
    pub text: String,
    pub marks: u32,
    pub options: Vec<SummaryOption>,
    pub correct_answer: Option<String>,
    pub your_answer: Option<String>,
    pub outcome: AnswerOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryView {
    pub title: String,
    pub description: String,
    pub total_marks: u32,
    pub questions: Vec<SummaryQuestion>,
}

pub async fn load_summary(
    api: &dyn ExamApi,
    test_id: i64,
    user_id: i64,
) -> Result<SummaryView, AppError> {
    let record = api.get_summary(test_id, user_id).await?;
    tracing::debug!(test_id, user_id, questions = record.questions.len(), "summary loaded");
    Ok(SummaryView::from(record))
}

fn highlight(
    option: &OptionRecord,
    correct: Option<&OptionRecord>,
    chosen: Option<&OptionRecord>,
) -> OptionHighlight {
    if correct.is_some_and(|c| c.id == option.id) {
        OptionHighlight::Correct
    } else if chosen.is_some_and(|c| c.id == option.id) {
        OptionHighlight::IncorrectChosen
    } else {
        OptionHighlight::Neutral
    }
}

impl From<SummaryQuestionRecord> for SummaryQuestion {
    fn from(record: SummaryQuestionRecord) -> Self {
        let correct = record.correct_option.as_ref();
        let chosen = record.chosen_option.as_ref();

        let outcome = match (chosen, correct) {
            (None, _) => AnswerOutcome::Unanswered,
            (Some(c), Some(k)) if c.id == k.id => AnswerOutcome::Correct,
            (Some(_), _) => AnswerOutcome::Wrong,
        };

        let options = record
            .options
            .iter()
            .map(|o| SummaryOption {
                id: o.id,
                text: clean_html(&o.option_text),
                highlight: highlight(o, correct, chosen),
            })
            .collect();

        SummaryQuestion {
            id: record.question_id,
            text: clean_html(&record.question_text),
            marks: record.marks,
            options,
            correct_answer: correct.map(|o| clean_html(&o.option_text)),
            your_answer: chosen.map(|o| clean_html(&o.option_text)),
            outcome,
        }
    }
}

impl From<TestSummaryRecord> for SummaryView {
    fn from(record: TestSummaryRecord) -> Self {
        SummaryView {
            title: clean_html(&record.test_title),
            description: clean_html(&record.test_description),
            total_marks: record.total_marks,
            questions: record.questions.into_iter().map(SummaryQuestion::from).collect(),
        }
    }
}

impl SummaryQuestion {
    pub fn correct_answer_line(&self) -> String {
        match &self.correct_answer {
            Some(text) => format!("Correct Answer: {}", strip_tags(text)),
            None => "Correct Answer: Not Available".to_string(),
        }
    }

    pub fn your_answer_line(&self) -> String {
        match &self.your_answer {
            Some(text) => format!("Your Answer: {}", strip_tags(text)),
            None => "Your Answer: No answer selected".to_string(),
        }
    }
}

impl SummaryView {
    pub fn total_marks_line(&self) -> String {
        format!("Total Marks: {}", self.total_marks)
    }

    pub fn answered(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| q.outcome != AnswerOutcome::Unanswered)
            .count()
    }

    /// Plain-text rendering of the review page.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = vec![strip_tags(&self.title)];
        if !self.description.is_empty() {
            lines.push(strip_tags(&self.description));
        }
        lines.push(self.total_marks_line());

        for (index, question) in self.questions.iter().enumerate() {
            lines.push(String::new());
            lines.push(format!(
                "{}. {} ({} marks)",
                index + 1,
                strip_tags(&question.text),
                question.marks
            ));
            for option in &question.options {
                let marker = match option.highlight {
                    OptionHighlight::Correct => "[+]",
                    OptionHighlight::IncorrectChosen => "[x]",
                    OptionHighlight::Neutral => "[ ]",
                };
                lines.push(format!("   {} {}", marker, strip_tags(&option.text)));
            }
            lines.push(question.correct_answer_line());
            lines.push(question.your_answer_line());
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TestSummaryRecord {
        serde_json::from_str(
            r#"{
                "testTitle": "Rust <b>Basics</b>",
                "testDescription": "",
                "totalMarks": 8,
                "questions": [
                    {
                        "questionId": 1,
                        "questionText": "Which keyword moves captures?",
                        "marks": 5,
                        "options": [{"id": 10, "optionText": "move"}, {"id": 11, "optionText": "ref"}],
                        "correctOption": {"id": 10, "optionText": "move"},
                        "chosenOption": {"id": 11, "optionText": "ref"}
                    },
                    {
                        "questionId": 2,
                        "questionText": "Pick a pointer<script>x()</script>",
                        "marks": 3,
                        "options": [{"id": 21, "optionText": "Box"}],
                        "correctOption": null,
                        "chosenOption": null
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_option_highlighting() {
        let view = SummaryView::from(record());
        let highlights: Vec<OptionHighlight> =
            view.questions[0].options.iter().map(|o| o.highlight).collect();

        assert_eq!(
            highlights,
            vec![OptionHighlight::Correct, OptionHighlight::IncorrectChosen]
        );
        assert_eq!(view.questions[0].outcome, AnswerOutcome::Wrong);
        assert_eq!(view.questions[1].outcome, AnswerOutcome::Unanswered);
        assert_eq!(view.questions[1].options[0].highlight, OptionHighlight::Neutral);
        assert_eq!(view.answered(), 1);
    }

    #[test]
    fn test_answer_lines() {
        let view = SummaryView::from(record());

        assert_eq!(view.questions[0].correct_answer_line(), "Correct Answer: move");
        assert_eq!(view.questions[0].your_answer_line(), "Your Answer: ref");
        assert_eq!(
            view.questions[1].correct_answer_line(),
            "Correct Answer: Not Available"
        );
        assert_eq!(
            view.questions[1].your_answer_line(),
            "Your Answer: No answer selected"
        );
        assert_eq!(view.total_marks_line(), "Total Marks: 8");
    }

    #[test]
    fn test_render_sanitizes_markup() {
        let lines = SummaryView::from(record()).render_lines();

        assert_eq!(lines[0], "Rust Basics");
        assert_eq!(lines[1], "Total Marks: 8");
        assert!(lines.iter().any(|l| l == "2. Pick a pointer (3 marks)"));
        assert!(lines.iter().all(|l| !l.contains("script")));
        assert!(lines.contains(&"   [x] ref".to_string()));
    }

    #[test]
    fn test_correct_choice_outcome() {
        let mut raw = record();
        raw.questions[0].chosen_option = raw.questions[0].correct_option.clone();
        let view = SummaryView::from(raw);
        assert_eq!(view.questions[0].outcome, AnswerOutcome::Correct);
        assert_eq!(view.questions[0].options[0].highlight, OptionHighlight::Correct);
        assert_eq!(view.questions[0].options[1].highlight, OptionHighlight::Neutral);
    }
}
