//! Raw curve retrieval for named reports.
//!
//! A report is fetched over a fixed trailing window: from two days ago at
//! 23:59:59 portal-local up to the current hour. The portal pages results,
//! but a single page of 288 entries covers three days of 15-minute
//! readings, so one request is enough for this window.

use crate::config::PortalConfig;
use crate::error::PortalError;
use crate::model::Curve;
use crate::w1000::session::SessionManager;
use chrono::{Duration, Utc};
use std::sync::Arc;

const PROFILE_DATA_PATH: &str = "/ProfileData/ProfileData";
/// Three days of 15-minute interval readings.
const PER_PAGE: u32 = 96 * 3;

pub struct ReportClient {
    sessions: Arc<SessionManager>,
    config: PortalConfig,
}

impl ReportClient {
    pub fn new(sessions: Arc<SessionManager>, config: PortalConfig) -> Self {
        Self { sessions, config }
    }

    /// Resolves a configured report name to its numeric report id by
    /// scanning all work-area windows of the current session for an exact
    /// name match.
    pub async fn resolve_report(&self, name: &str) -> Result<i64, PortalError> {
        let session = self.sessions.ensure_fresh().await?;
        for workarea in &session.workareas {
            for window in &workarea.windows {
                if window.name == name {
                    tracing::debug!(
                        "resolved report {} to id {} in workarea {}",
                        name,
                        window.reportid,
                        workarea.name
                    );
                    return Ok(window.reportid);
                }
            }
        }
        Err(PortalError::NotFound(name.to_string()))
    }

    /// Fetches the raw curves for one report over the trailing window.
    pub async fn fetch_report_data(
        &self,
        reportid: i64,
        name: &str,
    ) -> Result<Vec<Curve>, PortalError> {
        let session = self.sessions.ensure_fresh().await?;
        let now = Utc::now().naive_utc();

        let since = (now - Duration::days(2))
            .format("%Y-%m-%dT23:59:59")
            .to_string();
        let until = now.format("%Y-%m-%dT%H:00:00").to_string();
        // Cache buster the portal front end sends: epoch seconds of three
        // hours ago with a literal 557 appended.
        let cache_buster = format!("{}557", (Utc::now() - Duration::hours(3)).timestamp());

        tracing::debug!("reading report {} ({} .. {})", name, since, until);
        let response = session
            .http()
            .get(format!("{}{}", self.config.url, PROFILE_DATA_PATH))
            .query(&[
                ("page", "1".to_string()),
                ("perPage", PER_PAGE.to_string()),
                ("reportId", reportid.to_string()),
                ("since", since),
                ("until", until),
                ("_", cache_buster),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!("error reading report {}: http {}", name, status);
            tracing::debug!("report response body: {}", body);
            return Err(PortalError::protocol(status, body));
        }

        serde_json::from_str(&body)
            .map_err(|e| PortalError::payload(format!("curve array for report {}: {}", name, e)))
    }
}
