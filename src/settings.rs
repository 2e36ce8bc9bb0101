use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use url::Url;

/// Name of the INI file looked up next to the executable.
pub const CONFIG_FILE_NAME: &str = "config";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub credentials: Credentials,
    pub base_url: Url,
    pub debug: bool,
    pub timezone: Tz,
    pub window_days: u32,
    pub retry_delay_secs: u64,
    pub max_attempts: u32,
    pub night_start_hour: u32,
    pub night_end_hour: u32,
    pub night_pause_secs: u64,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Settings {
    /// Loads `path`, or the `config` file sitting next to the executable.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_file(&Self::default_path()?),
        }
    }

    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let exe = std::env::current_exe()
            .map_err(|err| ConfigError::Message(format!("cannot locate executable: {err}")))?;
        let dir = exe
            .parent()
            .ok_or_else(|| ConfigError::Message("executable has no parent directory".into()))?;
        Ok(dir.join(CONFIG_FILE_NAME))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            .set_default("base_url", "https://membres.temple-nobleart.fr")?
            .set_default("debug", false)?
            .set_default("timezone", "Europe/Paris")?
            .set_default("window_days", 5)?
            .set_default("retry_delay_secs", 5)?
            .set_default("max_attempts", 1000)?
            .set_default("night_start_hour", 2)?
            .set_default("night_end_hour", 6)?
            .set_default("night_pause_secs", 600)?
            .add_source(File::new(&path.to_string_lossy(), FileFormat::Ini))
            // NOBLEART_BASE_URL, NOBLEART_CREDENTIALS__EMAIL, ...
            .add_source(
                Environment::with_prefix("NOBLEART")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn night_pause(&self) -> Duration {
        Duration::from_secs(self.night_pause_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
