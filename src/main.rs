// src/main.rs

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use exam_portal::api::{ExamApi, HttpExamApi};
use exam_portal::config::Config;
use exam_portal::controller::{ExamController, ExamIds};
use exam_portal::error::AppError;
use exam_portal::proctoring::events::EventBus;
use exam_portal::state::ExamState;
use exam_portal::summary::load_summary;
use exam_portal::terminal::{
    ConsoleNavigator, ConsoleNotifier, HELP, forward_commands, status_line, terminal_options,
    terminal_platform,
};
use exam_portal::utils::jwt::inspect_live_token;
use tokio::io::BufReader;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "exam-portal", version, about = "Take a proctored exam from the terminal")]
struct Args {
    /// Test to take.
    #[arg(long)]
    test_id: i64,

    /// Defaults to the subject of AUTH_TOKEN.
    #[arg(long, env = "EXAM_USER_ID")]
    user_id: Option<i64>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "exam-portal.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(args, config));
    // Stdin reads block a worker thread until the next line; don't wait for it.
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "exam-portal failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, config: Config) -> Result<(), AppError> {
    let claims = inspect_live_token(&config.auth_token)?;
    let user_id = match args.user_id {
        Some(id) => id,
        None => claims.user_id()?,
    };
    tracing::info!(test_id = args.test_id, user_id, role = %claims.role, "starting exam client");

    let api: Arc<dyn ExamApi> = Arc::new(HttpExamApi::from_config(&config)?);
    let ids = ExamIds {
        test_id: args.test_id,
        user_id,
    };
    let mut controller = ExamController::new(api.clone(), terminal_platform(EventBus::new()), ids)
        .with_notifier(Arc::new(ConsoleNotifier))
        .with_navigator(Arc::new(ConsoleNavigator))
        .with_options(terminal_options())
        .with_timings(config.timings());

    let snapshots = controller.subscribe();
    let (commands, command_rx) = mpsc::unbounded_channel();
    let stdin = BufReader::new(tokio::io::stdin());
    let input = tokio::spawn(forward_commands(stdin, commands, snapshots.clone()));
    let printer = tokio::spawn(print_transitions(snapshots));

    println!("{}", HELP);
    let final_state = controller.run(command_rx).await;
    drop(controller);
    printer.abort();
    input.abort();

    if matches!(final_state, ExamState::Submitted { .. }) {
        let view = load_summary(api.as_ref(), ids.test_id, ids.user_id).await?;
        println!();
        for line in view.render_lines() {
            println!("{}", line);
        }
    }
    Ok(())
}

/// Prints phase changes, plus the countdown every minute and during the last ten seconds.
async fn print_transitions(mut snapshots: watch::Receiver<ExamState>) {
    let mut last = None;
    while snapshots.changed().await.is_ok() {
        let state = snapshots.borrow_and_update().clone();
        let current = (state.phase(), state.time_left());
        let countdown = match &state {
            ExamState::Active(attempt) => attempt.time_left % 60 == 0 || attempt.time_left <= 10,
            _ => false,
        };
        let phase_changed = last.map(|(phase, _)| phase) != Some(current.0);
        if phase_changed || (countdown && last != Some(current)) {
            println!("{}", status_line(&state));
        }
        last = Some(current);
    }
}
