pub mod booking;
pub mod command;
pub mod directory;
pub mod error;
pub mod form;
pub mod lesson_page;
pub mod models;
pub mod parser;
pub mod report;
pub mod session;
pub mod settings;
pub mod timing;

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::builder::NonEmptyStringValueParser;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::command::{Command, Outcome, dispatch};
use crate::error::AppError;
use crate::report::Status;
use crate::settings::Settings;

/// Book a Temple Noble Art lesson, or find the lessons of a coach or partner.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Five-digit lesson id to book, or the name of a coach (one word) or partner (several words)
    #[arg(value_parser = NonEmptyStringValueParser::new())]
    pub target: String,

    /// Configuration file (defaults to `config` next to the executable)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => return fail(AppError::from(err)),
    };

    init_logging(cli.verbose || settings.debug);
    let command = Command::parse(&cli.target);
    debug!(?command, "parsed command");

    run_until(dispatch(command, &settings), tokio::signal::ctrl_c()).await
}

/// Drives `work` to completion unless `shutdown` resolves first, in which
/// case whatever request or pause is pending is dropped and the run succeeds.
pub async fn run_until<W, S>(work: W, shutdown: S) -> ExitCode
where
    W: Future<Output = Result<Outcome, AppError>>,
    S: Future,
{
    tokio::select! {
        result = work => match result {
            Ok(outcome) => {
                outcome.print();
                ExitCode::from(outcome.exit_status())
            }
            Err(err) => fail(err),
        },
        _ = shutdown => {
            info!("interrupted");
            ExitCode::SUCCESS
        }
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn fail(err: AppError) -> ExitCode {
    if let AppError::Session(session::SessionError::Http(http)) = &err {
        error!("HTTP error: {http}");
    }
    report::print(Status::Error, &err.user_message());
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::booking::RegisterOutcome;
    use crate::timing::{Sleeper, TokioSleeper};

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_pause_exits_cleanly() {
        let work = async {
            TokioSleeper.sleep(Duration::from_secs(600)).await;
            Ok(Outcome::Register(RegisterOutcome::Deferred))
        };
        let started = tokio::time::Instant::now();

        let code = run_until(work, std::future::ready(())).await;

        assert_eq!(code, ExitCode::SUCCESS);
        assert!(started.elapsed() < Duration::from_secs(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_request_exits_cleanly() {
        let work = std::future::pending::<Result<Outcome, AppError>>();
        let shutdown = tokio::time::sleep(Duration::from_secs(1));

        assert_eq!(run_until(work, shutdown).await, ExitCode::SUCCESS);
    }

    #[tokio::test]
    async fn test_completed_work_sets_exit_code() {
        let deferred = async { Ok(Outcome::Register(RegisterOutcome::Deferred)) };
        assert_eq!(
            run_until(deferred, std::future::pending::<()>()).await,
            ExitCode::FAILURE
        );

        let registered = async { Ok(Outcome::Register(RegisterOutcome::Registered)) };
        assert_eq!(
            run_until(registered, std::future::pending::<()>()).await,
            ExitCode::SUCCESS
        );

        let failed = async {
            Err(AppError::RetriesExhausted {
                lesson_id: "12345".into(),
                attempts: 1000,
            })
        };
        assert_eq!(
            run_until(failed, std::future::pending::<()>()).await,
            ExitCode::FAILURE
        );
    }
}
