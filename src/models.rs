use serde::{Deserialize, Serialize};

use crate::parser::{self, ParseError};

/// One entry of the `/lessons.json` listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lesson {
    pub html_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub formatted_title: String,
    pub end: String,
    #[serde(rename = "full_lesson", default)]
    pub full: bool,
}

impl Lesson {
    pub fn id(&self) -> Result<String, ParseError> {
        parser::parse_lesson_id(&self.html_id)
    }

    pub fn has_id(&self, lesson_id: &str) -> bool {
        self.html_id == format!("lesson_{lesson_id}")
    }

    pub fn coach(&self) -> Result<String, ParseError> {
        parser::parse_coach(&self.description)
    }

    pub fn capacity(&self) -> Result<Capacity, ParseError> {
        parser::parse_capacity(&self.description)
    }

    pub fn summary(&self) -> Result<LessonSummary, ParseError> {
        Ok(LessonSummary {
            id: self.id()?,
            title: self.title.clone(),
            coach: self.coach()?,
            date: parser::parse_date(&self.end).to_string(),
            schedule: parser::parse_schedule(&self.formatted_title)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    pub reserved: u32,
    pub total: u32,
}

impl Capacity {
    pub fn is_full(&self) -> bool {
        self.reserved >= self.total
    }
}

/// A matched lesson as printed in search reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonSummary {
    pub id: String,
    pub title: String,
    pub coach: String,
    pub date: String,
    pub schedule: String,
}

impl std::fmt::Display for LessonSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {} - {} at {}",
            self.title, self.coach, self.date, self.schedule
        )
    }
}
