use chrono::{DateTime, Days, Local, NaiveDate};
use chrono_tz::Tz;
use tracing::debug;

use crate::models::Lesson;
use crate::session::{Endpoint, SessionClient, SessionError};

/// The `/lessons.json` timetable, looked at over a window of days starting today.
#[derive(Debug, Clone)]
pub struct LessonDirectory {
    timezone: Tz,
    window_days: u32,
}

impl LessonDirectory {
    pub fn new(timezone: Tz, window_days: u32) -> Self {
        Self {
            timezone,
            window_days,
        }
    }

    /// `[today, today + days]` on calendar-day granularity.
    pub fn window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
        let end = today
            .checked_add_days(Days::new(days.into()))
            .unwrap_or(NaiveDate::MAX);
        (today, end)
    }

    pub fn query(&self, now: DateTime<Local>) -> Vec<(&'static str, String)> {
        let (start, end) = Self::window(now.date_naive(), self.window_days);
        vec![
            ("start", start.format("%Y-%m-%d").to_string()),
            ("end", end.format("%Y-%m-%d").to_string()),
            ("_", now.timestamp_millis().to_string()),
            ("timezone", self.timezone.name().to_string()),
        ]
    }

    pub async fn list_lessons(
        &self,
        session: &SessionClient,
        now: DateTime<Local>,
    ) -> Result<Vec<Lesson>, SessionError> {
        let lessons: Vec<Lesson> = session
            .get_json(&Endpoint::Lessons, &self.query(now))
            .await?;
        debug!(count = lessons.len(), "fetched lesson listing");
        Ok(lessons)
    }

    /// `Some(full)` for a listed lesson, `None` when the id is not in the window.
    pub async fn is_full(
        &self,
        session: &SessionClient,
        lesson_id: &str,
        now: DateTime<Local>,
    ) -> Result<Option<bool>, SessionError> {
        let lessons = self.list_lessons(session, now).await?;
        Ok(find_lesson(&lessons, lesson_id).map(|lesson| lesson.full))
    }
}

/// The lesson with this id, provided exactly one entry carries it.
pub fn find_lesson<'a>(lessons: &'a [Lesson], lesson_id: &str) -> Option<&'a Lesson> {
    let mut matching = lessons.iter().filter(|lesson| lesson.has_id(lesson_id));
    match (matching.next(), matching.next()) {
        (Some(lesson), None) => Some(lesson),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn lesson(id: &str, full: bool) -> Lesson {
        Lesson {
            html_id: format!("lesson_{id}"),
            title: "Boxe".into(),
            description: String::new(),
            formatted_title: String::new(),
            end: "2026-10-20T20:00:00".into(),
            full,
        }
    }

    #[test]
    fn test_window_spans_month_end() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 29).unwrap();
        let (start, end) = LessonDirectory::window(today, 5);
        assert_eq!(start, today);
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 11, 3).unwrap());
    }

    #[test]
    fn test_query_parameters() {
        let directory = LessonDirectory::new(chrono_tz::Europe::Paris, 5);
        let now = Local.with_ymd_and_hms(2026, 10, 19, 12, 30, 0).unwrap();
        let query = directory.query(now);
        assert_eq!(query[0], ("start", "2026-10-19".to_string()));
        assert_eq!(query[1], ("end", "2026-10-24".to_string()));
        assert_eq!(query[2], ("_", now.timestamp_millis().to_string()));
        assert_eq!(query[3], ("timezone", "Europe/Paris".to_string()));
    }

    #[test]
    fn test_find_lesson() {
        let lessons = vec![lesson("11111", true), lesson("12345", false)];
        assert_eq!(find_lesson(&lessons, "12345").map(|l| l.full), Some(false));
        assert_eq!(find_lesson(&lessons, "11111").map(|l| l.full), Some(true));
        assert!(find_lesson(&lessons, "99999").is_none());
        assert!(find_lesson(&lessons, "1234").is_none());
    }

    #[test]
    fn test_find_lesson_ambiguous() {
        let lessons = vec![lesson("12345", false), lesson("12345", true)];
        assert!(find_lesson(&lessons, "12345").is_none());
    }
}
