use tracing::{debug, info, warn};

use crate::directory::LessonDirectory;
use crate::error::AppError;
use crate::lesson_page::{LessonPage, Registration};
use crate::models::LessonSummary;
use crate::report::{self, Status};
use crate::session::SessionClient;
use crate::timing::{Clock, NightGuard, RetryPolicy, Sleeper};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
    AlreadyRegistered,
    /// Night window hit; the caller's scheduler is expected to run us again.
    Deferred,
}

impl From<Registration> for RegisterOutcome {
    fn from(value: Registration) -> Self {
        match value {
            Registration::Registered => RegisterOutcome::Registered,
            Registration::AlreadyRegistered => RegisterOutcome::AlreadyRegistered,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Coach,
    Partner,
}

impl SearchKind {
    pub fn label(&self) -> &'static str {
        match self {
            SearchKind::Coach => "Coach",
            SearchKind::Partner => "Partner",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub kind: SearchKind,
    pub name: String,
    pub found: Vec<LessonSummary>,
}

impl SearchReport {
    pub fn subject(&self) -> String {
        format!("{} {}", self.kind.label(), self.name)
    }
}

/// Registration and search flows over a logged-in session.
pub struct Booker<'a, C, S> {
    session: &'a SessionClient,
    directory: LessonDirectory,
    night_guard: NightGuard,
    retry: RetryPolicy,
    clock: C,
    sleeper: S,
}

impl<'a, C: Clock, S: Sleeper> Booker<'a, C, S> {
    pub fn new(
        session: &'a SessionClient,
        directory: LessonDirectory,
        night_guard: NightGuard,
        retry: RetryPolicy,
        clock: C,
        sleeper: S,
    ) -> Self {
        Self {
            session,
            directory,
            night_guard,
            retry,
            clock,
            sleeper,
        }
    }

    /// Polls the listing until the lesson has a free spot, then books it.
    pub async fn register(&self, lesson_id: &str) -> Result<RegisterOutcome, AppError> {
        let delay = self.retry.delay.as_secs();
        for attempt in 1..=self.retry.max_attempts {
            if self.night_guard.is_night(self.clock.now()) {
                report::print(
                    Status::Night,
                    &format!(
                        "Night time ! Trying again in {} minutes...",
                        self.night_guard.pause.as_secs() / 60
                    ),
                );
                self.sleeper.sleep(self.night_guard.pause).await;
                return Ok(RegisterOutcome::Deferred);
            }

            match self
                .directory
                .is_full(self.session, lesson_id, self.clock.now())
                .await?
            {
                Some(false) => {
                    let page = LessonPage::open(self.session, lesson_id).await?;
                    return Ok(page.register(self.session).await?.into());
                }
                Some(true) => {
                    info!(lesson_id, attempt, "lesson is full");
                    report::print(
                        Status::Wait,
                        &format!("Lesson is full ! Trying again in {delay} seconds..."),
                    );
                }
                None => {
                    warn!(lesson_id, attempt, "lesson not found in the listing window");
                    report::print(
                        Status::Wait,
                        &format!(
                            "Lesson #{lesson_id} is not listed yet ! Trying again in {delay} seconds..."
                        ),
                    );
                }
            }
            self.sleeper.sleep(self.retry.delay).await;
        }

        Err(AppError::RetriesExhausted {
            lesson_id: lesson_id.to_string(),
            attempts: self.retry.max_attempts,
        })
    }

    /// Lessons of the window taught by `name` (coach) or booked by `name` (partner).
    pub async fn search(&self, name: &str, kind: SearchKind) -> Result<SearchReport, AppError> {
        let lessons = self
            .directory
            .list_lessons(self.session, self.clock.now())
            .await?;

        let mut found = Vec::new();
        for lesson in &lessons {
            let lesson_id = lesson.id()?;
            let coach = lesson.coach()?;
            let capacity = lesson.capacity()?;
            if capacity.is_full() != lesson.full {
                debug!(
                    lesson_id = %lesson_id,
                    reserved = capacity.reserved,
                    total = capacity.total,
                    full_lesson = lesson.full,
                    "description capacity disagrees with the listing's full flag"
                );
            }

            let matched = match kind {
                SearchKind::Coach => coach.contains(name),
                // Lessons the listing reports as empty are not opened.
                SearchKind::Partner if capacity.reserved == 0 => continue,
                SearchKind::Partner => LessonPage::open(self.session, &lesson_id)
                    .await?
                    .is_registered(name),
            };
            if matched {
                found.push(lesson.summary()?);
            }
        }

        Ok(SearchReport {
            kind,
            name: name.to_string(),
            found,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Duration;

    use chrono::{DateTime, Local, TimeZone};
    use url::Url;

    use super::*;
    use crate::session::SessionError;

    struct FixedClock(DateTime<Local>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Local> {
            self.0
        }
    }

    #[derive(Default)]
    struct RecordingSleeper(RefCell<Vec<Duration>>);

    impl Sleeper for &RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.0.borrow_mut().push(duration);
        }
    }

    fn booker<'a>(
        session: &'a SessionClient,
        hour: u32,
        sleeper: &'a RecordingSleeper,
    ) -> Booker<'a, FixedClock, &'a RecordingSleeper> {
        Booker::new(
            session,
            LessonDirectory::new(chrono_tz::Europe::Paris, 5),
            NightGuard {
                start_hour: 2,
                end_hour: 6,
                pause: Duration::from_secs(600),
            },
            RetryPolicy {
                delay: Duration::from_secs(5),
                max_attempts: 1000,
            },
            FixedClock(Local.with_ymd_and_hms(2026, 10, 19, hour, 0, 0).unwrap()),
            sleeper,
        )
    }

    fn offline_session() -> SessionClient {
        SessionClient::new(Url::parse("http://127.0.0.1:9").unwrap(), None).unwrap()
    }

    #[tokio::test]
    async fn test_night_guard_defers_without_requests() {
        let session = offline_session();
        for hour in [3, 4, 5] {
            let sleeper = RecordingSleeper::default();
            let outcome = booker(&session, hour, &sleeper).register("12345").await.unwrap();
            assert_eq!(outcome, RegisterOutcome::Deferred);
            assert_eq!(*sleeper.0.borrow(), vec![Duration::from_secs(600)]);
        }
    }

    #[tokio::test]
    async fn test_daytime_proceeds_to_listing() {
        // Outside the night window the first step is the listing, which the
        // login guard refuses on an anonymous session.
        let session = offline_session();
        for hour in [2, 6, 12] {
            let sleeper = RecordingSleeper::default();
            let err = booker(&session, hour, &sleeper).register("12345").await.unwrap_err();
            assert!(matches!(
                err,
                AppError::Session(SessionError::NotAuthenticated(_))
            ));
            assert!(sleeper.0.borrow().is_empty());
        }
    }

    #[test]
    fn test_search_subject() {
        let report = SearchReport {
            kind: SearchKind::Partner,
            name: "Jane Doe".into(),
            found: vec![],
        };
        assert_eq!(report.subject(), "Partner Jane Doe");
        assert_eq!(SearchKind::Coach.label(), "Coach");
    }
}
