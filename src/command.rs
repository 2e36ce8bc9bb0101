use tracing::info;

use crate::booking::{Booker, RegisterOutcome, SearchKind, SearchReport};
use crate::directory::LessonDirectory;
use crate::error::AppError;
use crate::report::{self, Status};
use crate::session::SessionClient;
use crate::settings::Settings;
use crate::timing::{Clock, NightGuard, RetryPolicy, Sleeper, SystemClock, TokioSleeper};

/// Lesson identifiers are always five digits long.
pub const LESSON_ID_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Register(String),
    WrongId(String),
    Search { name: String, kind: SearchKind },
}

impl Command {
    pub fn parse(arg: &str) -> Self {
        let all_digits = !arg.is_empty() && arg.chars().all(|c| c.is_ascii_digit());
        if all_digits {
            return if arg.len() == LESSON_ID_LEN {
                Command::Register(arg.to_string())
            } else {
                Command::WrongId(arg.to_string())
            };
        }

        let kind = if arg.contains(char::is_whitespace) {
            SearchKind::Partner
        } else {
            SearchKind::Coach
        };
        Command::Search {
            name: arg.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Register(RegisterOutcome),
    Search(SearchReport),
    WrongId(String),
}

impl Outcome {
    pub fn exit_status(&self) -> u8 {
        match self {
            Outcome::Register(RegisterOutcome::Deferred) | Outcome::WrongId(_) => 1,
            _ => 0,
        }
    }

    /// Status lines reporting this outcome, in print order.
    pub fn lines(&self) -> Vec<(Status, String)> {
        match self {
            Outcome::Register(RegisterOutcome::Registered) => {
                vec![(Status::Success, "Registered to lesson ! :-)".into())]
            }
            Outcome::Register(RegisterOutcome::AlreadyRegistered) => {
                vec![(Status::Info, "Already registered.".into())]
            }
            // The night line was printed before the pause.
            Outcome::Register(RegisterOutcome::Deferred) => vec![],
            Outcome::WrongId(_) => vec![(Status::Error, "Wrong id !".into())],
            Outcome::Search(search) if search.found.is_empty() => vec![(
                Status::Error,
                format!("{} not registered in any lesson.", search.subject()),
            )],
            Outcome::Search(search) => {
                let header = (Status::Success, format!("{} found in :", search.subject()));
                std::iter::once(header)
                    .chain(search.found.iter().map(|lesson| {
                        (Status::Info, format!("Lesson #{} : {}", lesson.id, lesson))
                    }))
                    .collect()
            }
        }
    }

    pub fn print(&self) {
        for (status, message) in self.lines() {
            report::print(status, &message);
        }
    }
}

pub async fn dispatch(command: Command, settings: &Settings) -> Result<Outcome, AppError> {
    dispatch_with(command, settings, SystemClock, TokioSleeper).await
}

/// Logs in and runs `command`. A malformed id is rejected before any request.
pub async fn dispatch_with<C: Clock, S: Sleeper>(
    command: Command,
    settings: &Settings,
    clock: C,
    sleeper: S,
) -> Result<Outcome, AppError> {
    if let Command::WrongId(arg) = command {
        return Ok(Outcome::WrongId(arg));
    }

    let mut session = SessionClient::new(settings.base_url.clone(), settings.request_timeout())?;
    session
        .login(&settings.credentials.email, &settings.credentials.password)
        .await?;
    info!(email = %settings.credentials.email, "logged in");

    let booker = Booker::new(
        &session,
        LessonDirectory::new(settings.timezone, settings.window_days),
        NightGuard::from(settings),
        RetryPolicy::from(settings),
        clock,
        sleeper,
    );

    match command {
        Command::Register(lesson_id) => Ok(Outcome::Register(booker.register(&lesson_id).await?)),
        Command::Search { name, kind } => Ok(Outcome::Search(booker.search(&name, kind).await?)),
        Command::WrongId(arg) => Ok(Outcome::WrongId(arg)),
    }
}
