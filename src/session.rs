use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::form::HtmlForm;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Incorrect email or password")]
    Authentication,
    #[error("{0} requires a logged-in session")]
    NotAuthenticated(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("No form found on {0}")]
    MissingForm(Url),
    #[error("No authenticity token in the login form of {0}")]
    MissingToken(Url),
    #[error("Expected {expected} but landed on {landed}")]
    UnexpectedPage { expected: String, landed: Url },
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// The pages of the members site this client knows how to reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    Sessions,
    Lessons,
    Lesson(String),
    Other(String),
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Login => "/login".into(),
            Endpoint::Sessions => "/sessions".into(),
            Endpoint::Lessons => "/lessons.json".into(),
            Endpoint::Lesson(id) => format!("/lessons/{id}"),
            Endpoint::Other(path) => path.clone(),
        }
    }

    /// Only the login form and its target may be reached anonymously.
    pub fn requires_login(&self) -> bool {
        !matches!(self, Endpoint::Login | Endpoint::Sessions)
    }

    pub fn recognize(url: &Url) -> Self {
        let path = url.path().trim_end_matches('/');
        match path {
            "/login" => Endpoint::Login,
            "/sessions" => Endpoint::Sessions,
            "/lessons.json" => Endpoint::Lessons,
            _ => match path.strip_prefix("/lessons/") {
                Some(id) if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) => {
                    Endpoint::Lesson(id.to_string())
                }
                _ => Endpoint::Other(path.to_string()),
            },
        }
    }

    /// Pages a rejected login lands back on.
    pub fn is_login_page(&self) -> bool {
        matches!(self, Endpoint::Login | Endpoint::Sessions)
    }
}

/// A fetched HTML page together with the URL it was finally served from.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub body: String,
}

impl Page {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::recognize(&self.url)
    }
}

/// Browser-like session against the members site: one cookie jar, plus the
/// CSRF token handed out by the login form once authenticated.
pub struct SessionClient {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl SessionClient {
    pub fn new(base_url: Url, timeout: Option<Duration>) -> Result<Self, SessionError> {
        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url,
            token: None,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn url(&self, endpoint: &Endpoint) -> Result<Url, SessionError> {
        Ok(self.base_url.join(&endpoint.path())?)
    }

    /// Submits the login form. The returned token is sent as `x-csrf-token`
    /// on every later request.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<String, SessionError> {
        let login = self.get(&Endpoint::Login).await?;
        let mut form = HtmlForm::first_in(&login.body, &login.url)
            .ok_or_else(|| SessionError::MissingForm(login.url.clone()))?;
        form.set("session[email]", email);
        form.set("session[password]", password);
        let token = form
            .field("authenticity_token")
            .ok_or_else(|| SessionError::MissingToken(login.url.clone()))?
            .to_string();

        let landed = self.submit(&form).await?;
        if landed.endpoint().is_login_page() {
            return Err(SessionError::Authentication);
        }

        debug!(url = %landed.url, "login accepted");
        self.token = Some(token.clone());
        Ok(token)
    }

    pub async fn get(&self, endpoint: &Endpoint) -> Result<Page, SessionError> {
        let url = self.url(endpoint)?;
        let response = self.send(endpoint, self.client.get(url)).await?;
        into_page(response).await
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        query: &[(&str, String)],
    ) -> Result<T, SessionError> {
        let url = self.url(endpoint)?;
        let response = self.send(endpoint, self.client.get(url).query(query)).await?;
        Ok(response.json().await?)
    }

    /// Sends `form` the way a browser would: urlencoded body for POST,
    /// query string otherwise.
    pub async fn submit(&self, form: &HtmlForm) -> Result<Page, SessionError> {
        let endpoint = Endpoint::recognize(&form.action);
        let request = if form.is_post() {
            self.client.post(form.action.clone()).form(&form.fields)
        } else {
            self.client.get(form.action.clone()).query(&form.fields)
        };
        let response = self.send(&endpoint, request).await?;
        into_page(response).await
    }

    fn require_login(&self, endpoint: &Endpoint) -> Result<(), SessionError> {
        if endpoint.requires_login() && !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated(endpoint.path()));
        }
        Ok(())
    }

    async fn send(
        &self,
        endpoint: &Endpoint,
        request: RequestBuilder,
    ) -> Result<Response, SessionError> {
        self.require_login(endpoint)?;
        let request = match &self.token {
            Some(token) => request
                .header("x-csrf-token", token)
                .header("x-requested-with", "XMLHttpRequest"),
            None => request,
        };
        let response = request.send().await?.error_for_status()?;
        info!("Now on {}", response.url());
        Ok(response)
    }
}

async fn into_page(response: Response) -> Result<Page, SessionError> {
    let url = response.url().clone();
    let body = response.text().await?;
    Ok(Page { url, body })
}
