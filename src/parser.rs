//! Extraction of structured values from the free text the site embeds in its
//! lesson listing.
//!
//! Lesson descriptions are small HTML fragments such as
//! `<p>Prof : <b>Jean Dupont</b></p><p>Places : 12/20</p>`: the coach name
//! follows the first `Prof...>` marker and the capacity is written as the
//! last two integers of the text (`reserved/total`). Formatted titles look
//! like `<b>Boxe anglaise</b> Lundi 19:00-20:30`, the schedule being the
//! text after the last tag from the first digit onwards.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::Capacity;

static COACH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Prof[^>]+.([\w\s-]+)").expect("regex compiles"));
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("regex compiles"));
static SCHEDULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r">[^\d]+(.+)").expect("regex compiles"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("No coach name found in lesson description: {0:?}")]
    Coach(String),
    #[error("No reserved/total capacity found in lesson description: {0:?}")]
    Capacity(String),
    #[error("No schedule found in lesson title: {0:?}")]
    Schedule(String),
    #[error("Malformed lesson identifier: {0:?}")]
    LessonId(String),
}

pub fn parse_coach(description: &str) -> Result<String, ParseError> {
    let coach = COACH_RE
        .captures(description)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|coach| !coach.is_empty());
    coach.ok_or_else(|| ParseError::Coach(description.to_string()))
}

pub fn parse_capacity(description: &str) -> Result<Capacity, ParseError> {
    let numbers: Vec<&str> = NUMBER_RE.find_iter(description).map(|m| m.as_str()).collect();
    let [.., reserved, total] = numbers.as_slice() else {
        return Err(ParseError::Capacity(description.to_string()));
    };
    let reserved = reserved
        .parse::<u32>()
        .map_err(|_| ParseError::Capacity(description.to_string()))?;
    let total = total
        .parse::<u32>()
        .map_err(|_| ParseError::Capacity(description.to_string()))?;
    Ok(Capacity { reserved, total })
}

/// Returns the schedule text of a formatted title, with ranges rewritten
/// from `19:00-20:30` to `19:00to20:30` the way the site's own summaries do.
pub fn parse_schedule(formatted_title: &str) -> Result<String, ParseError> {
    SCHEDULE_RE
        .captures_iter(formatted_title)
        .filter_map(|caps| caps.get(1))
        .last()
        .map(|m| m.as_str().trim().replace('-', "to"))
        .ok_or_else(|| ParseError::Schedule(formatted_title.to_string()))
}

/// `lesson_12345` -> `12345`
pub fn parse_lesson_id(html_id: &str) -> Result<String, ParseError> {
    let id = html_id.rsplit('_').next().unwrap_or_default();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::LessonId(html_id.to_string()));
    }
    Ok(id.to_string())
}

/// Date part of an ISO-8601 timestamp (`2026-10-21T20:30:00+02:00` -> `2026-10-21`).
pub fn parse_date(timestamp: &str) -> &str {
    timestamp.split('T').next().unwrap_or(timestamp)
}
