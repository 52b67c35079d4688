// src/terminal.rs

//! Console host for the exam controller.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, watch};

use crate::{
    controller::ExamCommand,
    error::AppError,
    models::{answer::AnswerMap, test::TestPaper},
    notify::{Navigator, Notifier},
    proctoring::{
        ProctoringOptions,
        events::EventBus,
        platform::{Alerter, Platform},
    },
    routes::View,
    state::ExamState,
    utils::{html::strip_tags, time::format_time_left},
};

pub const HELP: &str = "commands: start | answer <question> <option> | submit | time | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalCommand {
    Exam(ExamCommand),
    Time,
    Help,
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<TerminalCommand>, AppError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "start" => TerminalCommand::Exam(ExamCommand::Start),
        "submit" => TerminalCommand::Exam(ExamCommand::Submit),
        "quit" | "exit" => TerminalCommand::Exam(ExamCommand::Shutdown),
        "time" => TerminalCommand::Time,
        "help" => TerminalCommand::Help,
        "answer" => {
            let (Some(question), Some(option), None) = (words.next(), words.next(), words.next())
            else {
                return Err(AppError::InvalidState(
                    "usage: answer <question> <option>".to_string(),
                ));
            };
            let parse = |raw: &str| {
                raw.parse::<i64>()
                    .map_err(|_| AppError::InvalidState(format!("'{}' is not an id", raw)))
            };
            TerminalCommand::Exam(ExamCommand::Select {
                question_id: parse(question)?,
                option_id: parse(option)?,
            })
        }
        other => {
            return Err(AppError::InvalidState(format!("unknown command '{}'", other)));
        }
    };
    Ok(Some(command))
}

/// Proctoring the console can actually enforce: no devtools, no camera.
pub fn terminal_options() -> ProctoringOptions {
    ProctoringOptions {
        detect_dev_tools: false,
        require_camera: false,
        ..ProctoringOptions::all()
    }
}

pub fn terminal_platform(bus: Arc<EventBus>) -> Platform {
    Platform::headless(bus).with_alerts(Arc::new(ConsoleAlerter))
}

pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        println!("[ok] {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("[error] {}", message);
    }
}

pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, view: View) {
        tracing::debug!(path = %view.path(), "navigate");
        if view == View::Home {
            println!("Returning to the dashboard.");
        }
    }
}

pub struct ConsoleAlerter;

impl Alerter for ConsoleAlerter {
    fn alert(&self, message: &str) {
        eprintln!("!! {}", message);
    }
}

pub fn render_paper(paper: &TestPaper, answers: &AnswerMap) -> Vec<String> {
    let mut lines = vec![
        strip_tags(&paper.title),
        strip_tags(&paper.description),
        format!("Total Marks: {}", paper.total_marks),
    ];
    for (index, question) in paper.questions.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!(
            "{}. [q{}] {} ({} marks)",
            index + 1,
            question.id,
            strip_tags(&question.text),
            question.marks
        ));
        let selected = answers.selected(question.id);
        for option in &question.options {
            let marker = if selected == Some(option.id) { "(*)" } else { "( )" };
            lines.push(format!("   {} [o{}] {}", marker, option.id, strip_tags(&option.text)));
        }
    }
    lines
}

pub fn status_line(state: &ExamState) -> String {
    match state {
        ExamState::Loading => "Loading...".to_string(),
        ExamState::Blocked { message, .. } => message.clone(),
        ExamState::Ready(attempt) => format!(
            "Ready. Time left: {}. Type 'start' to begin.",
            format_time_left(attempt.time_left)
        ),
        ExamState::Active(attempt) => format!(
            "Time left: {} ({} answered)",
            format_time_left(attempt.time_left),
            attempt.answers.len()
        ),
        ExamState::Submitting {
            last_error: Some(error),
            ..
        } => format!("Submission failed ({}). Type 'submit' to retry.", error),
        ExamState::Submitting { .. } => "Submitting...".to_string(),
        ExamState::Submitted { score, .. } => format!("Submitted. Score: {}", score),
    }
}

/// Feeds stdin-style input into the controller until `quit` or end of input.
pub async fn forward_commands<R>(
    reader: R,
    commands: mpsc::UnboundedSender<ExamCommand>,
    snapshots: watch::Receiver<ExamState>,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e);
                println!("{}", HELP);
                continue;
            }
        };

        match command {
            TerminalCommand::Time => println!("{}", status_line(&snapshots.borrow())),
            TerminalCommand::Help => println!("{}", HELP),
            TerminalCommand::Exam(command) => {
                if command == ExamCommand::Start {
                    if let Some(attempt) = snapshots.borrow().attempt() {
                        for line in render_paper(&attempt.paper, &attempt.answers) {
                            println!("{}", line);
                        }
                    }
                }
                if commands.send(command).is_err() || command == ExamCommand::Shutdown {
                    break;
                }
            }
        }
    }
    Ok(())
}
