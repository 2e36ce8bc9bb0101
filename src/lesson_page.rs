use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::form::HtmlForm;
use crate::session::{Endpoint, SessionClient, SessionError};

static PARTICIPANT_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.lesson-participant-username").expect("selector parses")
});

/// Rails marks the update/cancel variant of the registration form with this field.
const METHOD_OVERRIDE_FIELD: &str = "_method";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered,
    AlreadyRegistered,
}

/// A lesson detail page: who is booked and the booking form.
#[derive(Debug, Clone)]
pub struct LessonPage {
    pub lesson_id: String,
    pub url: Url,
    pub participants: Vec<String>,
    pub form: Option<HtmlForm>,
}

impl LessonPage {
    /// Fetches `/lessons/{id}`. Being bounced to any other page (typically
    /// the login form of an expired session) is an error.
    pub async fn open(session: &SessionClient, lesson_id: &str) -> Result<Self, SessionError> {
        let expected = Endpoint::Lesson(lesson_id.to_string());
        let page = session.get(&expected).await?;
        match page.endpoint() {
            landed if landed == expected => Ok(Self::parse(lesson_id, page.url, &page.body)),
            landed if landed.is_login_page() => {
                Err(SessionError::NotAuthenticated(expected.path()))
            }
            _ => Err(SessionError::UnexpectedPage {
                expected: expected.path(),
                landed: page.url,
            }),
        }
    }

    pub fn parse(lesson_id: &str, url: Url, html: &str) -> Self {
        let document = Html::parse_document(html);
        let participants: Vec<String> = document
            .select(&PARTICIPANT_SEL)
            .map(|div| div.text().collect::<Vec<_>>().join(" "))
            .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect();
        debug!(lesson_id, participants = participants.len(), "parsed lesson page");

        let form = HtmlForm::first_in(html, &url);
        Self {
            lesson_id: lesson_id.to_string(),
            url,
            participants,
            form,
        }
    }

    /// Case-sensitive substring match against the participant names.
    pub fn is_registered(&self, name: &str) -> bool {
        self.participants.iter().any(|participant| participant.contains(name))
    }

    pub fn is_already_registered(&self) -> bool {
        self.form
            .as_ref()
            .is_some_and(|form| form.has_field(METHOD_OVERRIDE_FIELD))
    }

    /// Submits the booking form unless the page already shows the
    /// "registered" variant of it.
    pub async fn register(&self, session: &SessionClient) -> Result<Registration, SessionError> {
        let form = self
            .form
            .as_ref()
            .ok_or_else(|| SessionError::MissingForm(self.url.clone()))?;
        if self.is_already_registered() {
            debug!(lesson_id = %self.lesson_id, "registration form already in update state");
            return Ok(Registration::AlreadyRegistered);
        }
        let landed = session.submit(form).await?;
        if landed.endpoint().is_login_page() {
            return Err(SessionError::NotAuthenticated(form.action.path().to_string()));
        }
        Ok(Registration::Registered)
    }
}
