// src/controller/mod.rs

//! Exam session controller.
//!
//! Owns the [`ExamState`] machine and is the only writer of the answer map and
//! the countdown. [`ExamController::run`] is the event loop: user commands,
//! countdown ticks and proctoring violations are handled one at a time, so a
//! timer expiry and a fatal violation arriving together still produce a single
//! submission.

pub mod score;

use std::mem;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

use crate::{
    api::ExamApi,
    config::Timings,
    error::AppError,
    models::{
        answer::{AnswerMap, SubmitAnswersRequest},
        session::SessionStatus,
        test::TestPaper,
    },
    notify::{LogNavigator, LogNotifier, Navigator, Notifier},
    proctoring::{
        ActiveProctoring, Proctoring, ProctoringOptions, ProctoringStatus, Violation,
        platform::Platform,
    },
    routes::View,
    state::{ExamAttempt, ExamState},
    utils::time::{Clock, SystemClock, format_local},
};

pub use self::score::calculate_score;

pub const LOAD_FAILED: &str = "Failed to update session status.";
pub const ALREADY_ENDED: &str = "Test has already ended.";
pub const SUBMIT_SUCCEEDED: &str = "Test submitted successfully!";
pub const SUBMIT_FAILED: &str = "Error submitting the test.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamIds {
    pub test_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    TimerExpired,
    Violation(Violation),
    User,
}

/// User input fed to [`ExamController::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamCommand {
    Start,
    Select { question_id: i64, option_id: i64 },
    Submit,
    Shutdown,
}

/// Resources that only exist while the exam is `Active`.
struct LiveExam {
    proctoring: ActiveProctoring,
    ticker: Interval,
}

enum Wake {
    Command(Option<ExamCommand>),
    Tick,
    Violation(Violation),
}

pub struct ExamController {
    api: Arc<dyn ExamApi>,
    platform: Platform,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    ids: ExamIds,
    options: ProctoringOptions,
    timings: Timings,
    state: ExamState,
    live: Option<LiveExam>,
    snapshots: watch::Sender<ExamState>,
}

impl ExamController {
    pub fn new(api: Arc<dyn ExamApi>, platform: Platform, ids: ExamIds) -> Self {
        let (snapshots, _) = watch::channel(ExamState::Loading);
        Self {
            api,
            platform,
            notifier: Arc::new(LogNotifier),
            navigator: Arc::new(LogNavigator),
            clock: Arc::new(SystemClock),
            ids,
            options: ProctoringOptions::all(),
            timings: Timings::default(),
            state: ExamState::Loading,
            live: None,
            snapshots,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_options(mut self, options: ProctoringOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn ids(&self) -> ExamIds {
        self.ids
    }

    pub fn state(&self) -> &ExamState {
        &self.state
    }

    /// Receives a copy of the state after every transition and tick.
    pub fn subscribe(&self) -> watch::Receiver<ExamState> {
        self.snapshots.subscribe()
    }

    /// Merged proctoring status, while the exam is active.
    pub fn proctoring_status(&self) -> Option<ProctoringStatus> {
        self.live.as_ref().map(|live| live.proctoring.status())
    }

    pub fn proctoring_updates(&self) -> Option<watch::Receiver<ProctoringStatus>> {
        self.live.as_ref().map(|live| live.proctoring.subscribe())
    }

    fn set_state(&mut self, next: ExamState) {
        tracing::debug!(from = ?self.state.phase(), to = ?next.phase(), "exam state transition");
        self.state = next;
        self.publish();
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.state.clone());
    }

    /// Resolves the page into `Blocked` or `Ready`. Only acts in `Loading`.
    pub async fn load(&mut self) -> &ExamState {
        if !matches!(self.state, ExamState::Loading) {
            return &self.state;
        }

        let next = match self.fetch().await {
            Ok(next) => next,
            Err(AppError::Assignment(message)) => ExamState::Blocked {
                message,
                paper: None,
            },
            Err(err) => {
                tracing::error!(error = %err, test_id = self.ids.test_id, "failed to load exam");
                self.notifier.error(LOAD_FAILED);
                self.navigator.navigate(View::Home);
                ExamState::Blocked {
                    message: LOAD_FAILED.to_string(),
                    paper: None,
                }
            }
        };

        if let Some(message) = next.blocked_message() {
            tracing::info!(test_id = self.ids.test_id, %message, "exam blocked");
        }
        self.set_state(next);
        &self.state
    }

    async fn fetch(&self) -> Result<ExamState, AppError> {
        let ExamIds { test_id, user_id } = self.ids;

        self.ensure_assigned(test_id).await?;

        let paper = TestPaper::from(self.api.get_test(test_id).await?);
        if !paper.marks_reconciled() {
            tracing::warn!(
                test_id,
                total_marks = paper.total_marks,
                question_marks = paper.question_marks(),
                "test marks do not add up"
            );
        }

        let session = self.api.update_status(user_id, test_id).await?;

        let next = match session.status {
            SessionStatus::Pending => ExamState::Blocked {
                message: format!(
                    "Test has not started yet. It will start at {}",
                    format_local(session.start_time)
                ),
                paper: Some(paper),
            },
            SessionStatus::Completed => ExamState::Blocked {
                message: ALREADY_ENDED.to_string(),
                paper: Some(paper),
            },
            SessionStatus::InProgress => {
                let time_left = session.seconds_left(self.clock.now());
                tracing::info!(session_id = session.id, time_left, "exam ready");
                ExamState::Ready(ExamAttempt {
                    session,
                    paper,
                    answers: AnswerMap::new(),
                    time_left,
                })
            }
        };
        Ok(next)
    }

    /// Refusals (403/404, or an `error` field in the body) become
    /// [`AppError::Assignment`]; anything else is a load failure.
    async fn ensure_assigned(&self, test_id: i64) -> Result<(), AppError> {
        match self.api.check_assignment(test_id).await {
            Ok(assignment) => match assignment.error {
                Some(error) => Err(AppError::Assignment(error)),
                None => Ok(()),
            },
            Err(AppError::Api { status, message }) if status == 403 || status == 404 => {
                Err(AppError::Assignment(message))
            }
            Err(err) => Err(err),
        }
    }

    /// `Ready -> Active`: activates proctoring and the countdown.
    pub async fn start(&mut self) -> Result<(), AppError> {
        if !matches!(self.state, ExamState::Ready(_)) {
            return Err(AppError::InvalidState(format!(
                "cannot start an exam in {:?}",
                self.state.phase()
            )));
        }

        let proctoring = Proctoring::activate(&self.platform, self.options, &self.timings)?;
        let period = self.timings.tick_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.live = Some(LiveExam { proctoring, ticker });

        let ExamState::Ready(attempt) = mem::replace(&mut self.state, ExamState::Loading) else {
            return Err(AppError::InvalidState("exam is not ready".to_string()));
        };
        let time_left = attempt.time_left;
        tracing::info!(session_id = attempt.session.id, time_left, "exam started");
        self.set_state(ExamState::Active(attempt));

        if let Err(e) = self.platform.fullscreen.request_fullscreen().await {
            tracing::warn!(error = %e, "Fullscreen request denied");
        }

        if time_left == 0 {
            self.submit(SubmitTrigger::TimerExpired).await?;
        }
        Ok(())
    }

    /// Records an answer. Later selections for the same question replace earlier ones.
    pub fn select_option(&mut self, question_id: i64, option_id: i64) -> Result<(), AppError> {
        let ExamState::Active(attempt) = &mut self.state else {
            return Err(AppError::InvalidState(
                "answers can only be changed during an active exam".to_string(),
            ));
        };

        let known = attempt
            .paper
            .question(question_id)
            .is_some_and(|q| q.has_option(option_id));
        if !known {
            return Err(AppError::InvalidState(format!(
                "option {} does not belong to question {}",
                option_id, question_id
            )));
        }

        attempt.answers.select(question_id, option_id);
        self.publish();
        Ok(())
    }

    /// Runs the submission sequence at most once per trigger burst.
    ///
    /// From `Active` any trigger submits. After a failed attempt the exam stays
    /// in `Submitting` and only [`SubmitTrigger::User`] retries; every other
    /// trigger is ignored.
    pub async fn submit(&mut self, trigger: SubmitTrigger) -> Result<(), AppError> {
        let retry = match &self.state {
            ExamState::Active(_) => false,
            ExamState::Submitting {
                in_flight: false,
                last_error: Some(_),
                ..
            } if trigger == SubmitTrigger::User => true,
            ExamState::Submitting { .. } | ExamState::Submitted { .. } => {
                tracing::debug!(?trigger, "submission already handled, trigger ignored");
                return Ok(());
            }
            other => {
                return Err(AppError::InvalidState(format!(
                    "cannot submit an exam in {:?}",
                    other.phase()
                )));
            }
        };

        let attempt = match mem::replace(&mut self.state, ExamState::Loading) {
            ExamState::Active(attempt) | ExamState::Submitting { attempt, .. } => attempt,
            other => {
                self.state = other;
                return Ok(());
            }
        };
        self.teardown();

        let body = attempt.answers.to_request();
        let score = calculate_score(&attempt.paper, &attempt.answers);
        let session_id = attempt.session.id;
        tracing::info!(?trigger, session_id, retry, answered = attempt.answers.len(), "submitting exam");

        self.set_state(ExamState::Submitting {
            attempt,
            in_flight: true,
            last_error: None,
        });

        let result = self.persist(session_id, &body, score).await;
        self.finish_submission(result, score)
    }

    async fn persist(
        &self,
        session_id: i64,
        body: &SubmitAnswersRequest,
        score: u32,
    ) -> Result<(), AppError> {
        self.api.submit_answers(session_id, body).await?;
        self.api.end_session(session_id, score).await?;
        Ok(())
    }

    fn finish_submission(&mut self, result: Result<(), AppError>, score: u32) -> Result<(), AppError> {
        match result {
            Ok(()) => {
                if let ExamState::Submitting { attempt, .. } =
                    mem::replace(&mut self.state, ExamState::Loading)
                {
                    tracing::info!(session_id = attempt.session.id, score, "exam submitted");
                    self.set_state(ExamState::Submitted { attempt, score });
                }
                self.notifier.success(SUBMIT_SUCCEEDED);
                self.navigator.navigate(View::Summary {
                    test_id: self.ids.test_id,
                    user_id: self.ids.user_id,
                });
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "exam submission failed");
                if let ExamState::Submitting {
                    in_flight,
                    last_error,
                    ..
                } = &mut self.state
                {
                    *in_flight = false;
                    *last_error = Some(err.to_string());
                }
                self.publish();
                self.notifier.error(SUBMIT_FAILED);
                Err(err)
            }
        }
    }

    async fn on_tick(&mut self) {
        let ExamState::Active(attempt) = &mut self.state else {
            return;
        };
        attempt.time_left = attempt.time_left.saturating_sub(1);
        let expired = attempt.time_left == 0;
        self.publish();

        if expired {
            tracing::info!("time is up");
            if let Err(e) = self.submit(SubmitTrigger::TimerExpired).await {
                tracing::warn!(error = %e, "submission after time-out failed");
            }
        }
    }

    async fn on_violation(&mut self, violation: Violation) {
        if !matches!(self.state, ExamState::Active(_)) {
            return;
        }
        let Some(message) = violation.termination_message() else {
            tracing::warn!(?violation, "proctoring warning");
            return;
        };

        self.platform.alerts.alert(message);
        if let Err(e) = self.submit(SubmitTrigger::Violation(violation)).await {
            tracing::warn!(error = %e, "forced submission failed");
        }
    }

    async fn handle_command(&mut self, command: ExamCommand) {
        let result = match command {
            ExamCommand::Start => self.start().await,
            ExamCommand::Select {
                question_id,
                option_id,
            } => self.select_option(question_id, option_id),
            ExamCommand::Submit => self.submit(SubmitTrigger::User).await,
            ExamCommand::Shutdown => Ok(()),
        };
        if let Err(e) = result {
            tracing::warn!(?command, error = %e, "command rejected");
        }
    }

    /// Event loop. Loads if needed, then serves commands, ticks and violations
    /// until the exam is blocked or submitted, the command channel closes, or
    /// `Shutdown` arrives. Returns the final state.
    pub async fn run(&mut self, mut commands: mpsc::UnboundedReceiver<ExamCommand>) -> ExamState {
        self.load().await;

        while !self.state.is_terminal() {
            match next_wake(&mut self.live, &mut commands).await {
                Wake::Command(None) | Wake::Command(Some(ExamCommand::Shutdown)) => break,
                Wake::Command(Some(command)) => self.handle_command(command).await,
                Wake::Tick => self.on_tick().await,
                Wake::Violation(violation) => self.on_violation(violation).await,
            }
        }

        self.teardown();
        self.state.clone()
    }

    /// Detaches proctoring and stops the countdown.
    fn teardown(&mut self) {
        if let Some(live) = self.live.take() {
            live.proctoring.deactivate();
        }
    }
}

impl Drop for ExamController {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn next_wake(
    live: &mut Option<LiveExam>,
    commands: &mut mpsc::UnboundedReceiver<ExamCommand>,
) -> Wake {
    match live {
        Some(live) => tokio::select! {
            command = commands.recv() => Wake::Command(command),
            _ = live.ticker.tick() => Wake::Tick,
            Some(violation) = live.proctoring.next_violation() => Wake::Violation(violation),
        },
        None => Wake::Command(commands.recv().await),
    }
}
