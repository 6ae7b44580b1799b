//! Login session management for the W1000 portal.
//!
//! The portal authenticates with an anti-forgery token scraped from the
//! login page, a form POST, and a session cookie. A successful login
//! response embeds a `W1000.start(...)` script literal carrying the current
//! user and the work-area/window layout; that document is the only place
//! report names can be resolved to report ids.

use crate::config::PortalConfig;
use crate::error::PortalError;
use crate::model::SessionDocument;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use reqwest::Client as HttpClient;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::{Mutex, RwLock};

const LOGIN_PATH: &str = "/Account/Login";
const TOKEN_SELECTOR: &str = "#pg-login input[name=__RequestVerificationToken]";

/// An authenticated portal session.
///
/// A session is either absent or fully populated; it is created whole by
/// [`SessionManager::login`] and never mutated afterwards. The embedded
/// HTTP client owns the cookie jar the portal issued at login time, so
/// report fetches made through a snapshot keep working even after a newer
/// session has replaced it.
pub struct Session {
    http: HttpClient,
    pub current_user: String,
    pub workareas: Vec<crate::model::WorkArea>,
    created_at: DateTime<Utc>,
}

impl Session {
    /// The HTTP client carrying this session's cookies.
    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Whether the session is younger than the given maximum age.
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        Utc::now() - self.created_at <= max_age
    }
}

/// Owns the session lifecycle: `NoSession -> LoggingIn -> Active -> Stale`.
///
/// Readers take an immutable `Arc<Session>` snapshot; a new login swaps the
/// whole session in one write, so no caller ever observes a half-updated
/// one. Logins are serialized behind a mutex with a recheck after
/// acquisition, so parallel report fetches that both find the session stale
/// share a single login.
pub struct SessionManager {
    config: PortalConfig,
    session: RwLock<Option<Arc<Session>>>,
    login_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(config: PortalConfig) -> Self {
        Self {
            config,
            session: RwLock::new(None),
            login_lock: Mutex::new(()),
        }
    }

    /// Returns the current session, logging in first when there is none or
    /// it has outlived the configured maximum age.
    pub async fn ensure_fresh(&self) -> Result<Arc<Session>, PortalError> {
        let max_age = Duration::minutes(self.config.session_max_age_min as i64);
        if let Some(session) = self.snapshot().await {
            if session.is_fresh(max_age) {
                return Ok(session);
            }
            tracing::debug!(
                "session older than {} minutes, logging in again",
                self.config.session_max_age_min
            );
        }
        self.login().await
    }

    /// The current session snapshot, fresh or not.
    pub async fn snapshot(&self) -> Option<Arc<Session>> {
        self.session.read().await.clone()
    }

    /// Performs the full login protocol and atomically replaces any prior
    /// session. On failure the prior session is left untouched; a still
    /// valid one keeps serving fetches until its own freshness window ends.
    pub async fn login(&self) -> Result<Arc<Session>, PortalError> {
        let _guard = self.login_lock.lock().await;

        // Another caller may have completed a login while we waited.
        let max_age = Duration::minutes(self.config.session_max_age_min as i64);
        if let Some(session) = self.snapshot().await {
            if session.is_fresh(max_age) {
                return Ok(session);
            }
        }

        let session = Arc::new(self.perform_login().await?);
        *self.session.write().await = Some(Arc::clone(&session));
        tracing::info!("logged in to portal as {}", session.current_user);
        Ok(session)
    }

    async fn perform_login(&self) -> Result<Session, PortalError> {
        let http = HttpClient::builder()
            .cookie_store(true)
            .timeout(StdDuration::from_secs(self.config.http_timeout_sec))
            .build()?;
        let login_url = format!("{}{}", self.config.url, LOGIN_PATH);

        let response = http.get(&login_url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!("login page returned http {}", status);
            tracing::debug!("login page body: {}", body);
            return Err(PortalError::protocol(status, body));
        }
        let token = extract_verification_token(&body)?;

        let form = [
            ("__RequestVerificationToken", token.as_str()),
            ("UserName", self.config.user.as_str()),
            ("Password", self.config.password.as_str()),
        ];
        let response = http.post(&login_url).form(&form).send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("login response http {}", status);
        if !status.is_success() {
            tracing::error!("login failed with http {}", status);
            tracing::debug!("login response body: {}", body);
            return Err(PortalError::protocol(status, body));
        }

        let document = extract_session_document(&body)?;
        for workarea in &document.workareas {
            for window in &workarea.windows {
                tracing::debug!("found report {} in workarea {}", window.name, workarea.name);
            }
        }

        Ok(Session {
            http,
            current_user: document.current_user,
            workareas: document.workareas,
            created_at: Utc::now(),
        })
    }
}

/// Scrapes the anti-forgery token from the login page.
fn extract_verification_token(html: &str) -> Result<String, PortalError> {
    let selector = Selector::parse(TOKEN_SELECTOR)
        .map_err(|e| PortalError::payload(format!("invalid selector: {}", e)))?;
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(|value| value.to_string())
        .ok_or_else(|| PortalError::auth("verification token not found on login page"))
}

/// Pulls the `W1000.start(...)` script literal out of the login response
/// and parses it into a [`SessionDocument`].
///
/// The literal is a JavaScript object with unquoted keys; parsing it as a
/// YAML flow mapping tolerates that. The capture runs up to the
/// `sessionTimeout` key and is re-closed with a brace, the same trick the
/// portal's own front end relies on being well-formed.
fn extract_session_document(body: &str) -> Result<SessionDocument, PortalError> {
    let flattened = body.replace('\n', " ");
    let pattern = Regex::new(r"W1000\.start\((.+)sessionTimeout")
        .map_err(|e| PortalError::payload(format!("invalid pattern: {}", e)))?;
    let captured = pattern
        .captures(&flattened)
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| {
            PortalError::auth(
                "session payload missing from login response; invalid or locked account?",
            )
        })?;

    let literal = format!("{}}}", captured.as_str());
    serde_yaml::from_str(&literal)
        .map_err(|e| PortalError::payload(format!("session document: {}", e)))
}
