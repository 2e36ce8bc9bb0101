use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Local, Timelike};

use crate::settings::Settings;

pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Registration is not attempted while the site is in its nightly
/// maintenance window (local hour strictly between `start_hour` and `end_hour`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightGuard {
    pub start_hour: u32,
    pub end_hour: u32,
    pub pause: Duration,
}

impl NightGuard {
    pub fn is_night(&self, now: DateTime<Local>) -> bool {
        let hour = now.hour();
        self.start_hour < hour && hour < self.end_hour
    }
}

/// Polling policy while a lesson is full or not listed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl From<&Settings> for NightGuard {
    fn from(settings: &Settings) -> Self {
        Self {
            start_hour: settings.night_start_hour,
            end_hour: settings.night_end_hour,
            pause: settings.night_pause(),
        }
    }
}

impl From<&Settings> for RetryPolicy {
    fn from(settings: &Settings) -> Self {
        Self {
            delay: settings.retry_delay(),
            max_attempts: settings.max_attempts,
        }
    }
}
