use config::ConfigError;
use thiserror::Error;

use crate::parser::ParseError;
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Settings(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Unexpected lesson listing format: {0}")]
    Parse(#[from] ParseError),
    #[error("Lesson #{lesson_id} still unavailable after {attempts} attempts")]
    RetriesExhausted { lesson_id: String, attempts: u32 },
}

impl AppError {
    /// Text of the red status line shown before exiting.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Session(SessionError::Authentication) => "Incorrect credentials !".into(),
            AppError::Session(SessionError::Http(err)) => format!("Network error: {err}"),
            other => other.to_string(),
        }
    }
}
