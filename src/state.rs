// src/state.rs

use crate::models::{answer::AnswerMap, session::Session, test::TestPaper};

/// Everything a started (or startable) exam needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamAttempt {
    pub session: Session,
    pub paper: TestPaper,
    pub answers: AnswerMap,
    /// Seconds until the session ends. Only decreases.
    pub time_left: u64,
}

/// Exam page state machine.
///
/// `Loading -> {Blocked | Ready} -> Active -> Submitting -> Submitted`.
/// Variants past `Loading` carry the attempt, so an active exam without a
/// session cannot be constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum ExamState {
    Loading,

    /// Not takeable from this page view. Terminal.
    Blocked {
        message: String,
        paper: Option<TestPaper>,
    },

    Ready(ExamAttempt),

    Active(ExamAttempt),

    /// Answers are frozen. `last_error` is set when the previous attempt to
    /// persist them failed; only an explicit user submit retries.
    Submitting {
        attempt: ExamAttempt,
        in_flight: bool,
        last_error: Option<String>,
    },

    Submitted {
        attempt: ExamAttempt,
        score: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Blocked,
    Ready,
    Active,
    Submitting,
    Submitted,
}

impl ExamState {
    pub fn phase(&self) -> Phase {
        match self {
            ExamState::Loading => Phase::Loading,
            ExamState::Blocked { .. } => Phase::Blocked,
            ExamState::Ready(_) => Phase::Ready,
            ExamState::Active(_) => Phase::Active,
            ExamState::Submitting { .. } => Phase::Submitting,
            ExamState::Submitted { .. } => Phase::Submitted,
        }
    }

    pub fn attempt(&self) -> Option<&ExamAttempt> {
        match self {
            ExamState::Ready(attempt)
            | ExamState::Active(attempt)
            | ExamState::Submitting { attempt, .. }
            | ExamState::Submitted { attempt, .. } => Some(attempt),
            ExamState::Loading | ExamState::Blocked { .. } => None,
        }
    }

    pub fn time_left(&self) -> Option<u64> {
        self.attempt().map(|a| a.time_left)
    }

    pub fn blocked_message(&self) -> Option<&str> {
        match self {
            ExamState::Blocked { message, .. } => Some(message),
            _ => None,
        }
    }

    /// No further transitions without leaving the page.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExamState::Blocked { .. } | ExamState::Submitted { .. })
    }
}
