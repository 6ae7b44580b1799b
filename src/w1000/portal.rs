//! Facade tying session, report retrieval and aggregation together.
//!
//! One poll cycle resolves and fetches every configured report
//! independently, imports the aggregated statistic points into the sink,
//! rebuilds the entity-state map and notifies the registered listeners.
//! A failing report is logged and omitted from the cycle's result; it
//! never aborts the other reports or the cycle itself.

use crate::config::PortalConfig;
use crate::error::PortalError;
use crate::influxdb::StatisticsSink;
use crate::model::{normalize_statistic_id, EntityState, ReportSummary, StatisticMetadata};
use crate::w1000::aggregate::aggregate_curves;
use crate::w1000::report::ReportClient;
use crate::w1000::session::SessionManager;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Callback seam for the entity layer.
///
/// Registering a listener fires an immediate callback; afterwards every
/// successful poll cycle fires all registered callbacks once.
pub trait UpdateListener: Send + Sync {
    /// Identifier used in logs.
    fn entity_id(&self) -> &str;

    /// Called whenever fresh entity state may be available.
    fn update_callback(&self);
}

pub struct PortalClient {
    config: PortalConfig,
    reports: ReportClient,
    sink: Arc<dyn StatisticsSink>,
    data: RwLock<HashMap<String, EntityState>>,
    listeners: RwLock<Vec<Arc<dyn UpdateListener>>>,
}

impl PortalClient {
    pub fn new(config: PortalConfig, sink: Arc<dyn StatisticsSink>) -> Self {
        let sessions = Arc::new(SessionManager::new(config.clone()));
        let reports = ReportClient::new(sessions, config.clone());
        Self {
            config,
            reports,
            sink,
            data: RwLock::new(HashMap::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Polls every configured report once and returns the summaries of the
    /// reports that produced data. Per-report failures are absorbed here.
    pub async fn poll_all(&self) -> HashMap<String, ReportSummary> {
        let mut summaries = HashMap::new();
        for name in self.config.report_names() {
            match self.poll_report(&name).await {
                Ok(Some(summary)) => {
                    summaries.insert(name, summary);
                }
                Ok(None) => {
                    tracing::debug!("report {} produced no data this cycle", name);
                }
                Err(err) => {
                    tracing::error!("report {} failed this cycle: {}", name, err);
                }
            }
        }
        summaries
    }

    /// One report's resolve-fetch-aggregate-import pipeline.
    async fn poll_report(&self, name: &str) -> Result<Option<ReportSummary>, PortalError> {
        let reportid = self.reports.resolve_report(name).await?;
        let curves = self.reports.fetch_report_data(reportid, name).await?;
        let (points, summary) = aggregate_curves(&curves);

        if let Some(summary) = &summary {
            if !points.is_empty() {
                let statistic_id = normalize_statistic_id(name);
                let metadata = StatisticMetadata::for_report(name, &summary.unit);
                tracing::debug!("import statistics: {} count: {}", statistic_id, points.len());
                if let Err(err) = self
                    .sink
                    .import_statistics(&statistic_id, &metadata, &points)
                    .await
                {
                    // Sink trouble must not cost us the summary; the sink
                    // tolerates re-imports on a later cycle.
                    tracing::warn!("statistics import failed for {}: {}", statistic_id, err);
                }
            }
        }

        Ok(summary)
    }

    /// Runs a full poll cycle: fetch all reports, rebuild the entity-state
    /// map wholesale, notify listeners.
    pub async fn update(&self) {
        let configured = self.config.report_names().len();
        let summaries = self.poll_all().await;
        tracing::info!(
            "poll cycle complete: {} of {} reports updated",
            summaries.len(),
            configured
        );

        let prepared: HashMap<String, EntityState> = summaries
            .iter()
            .map(|(name, summary)| (name.clone(), EntityState::from_summary(summary)))
            .collect();
        *self.data.write().await = prepared;

        self.notify_listeners().await;
    }

    /// The current entity state for one report, if its last poll succeeded.
    pub async fn data(&self, name: &str) -> Option<EntityState> {
        self.data.read().await.get(name).cloned()
    }

    /// Registers a listener and fires its callback immediately.
    pub async fn add_listener(&self, listener: Arc<dyn UpdateListener>) {
        tracing::debug!("registered sensor: {}", listener.entity_id());
        listener.update_callback();
        self.listeners.write().await.push(listener);
    }

    async fn notify_listeners(&self) {
        let listeners = self.listeners.read().await;
        for listener in listeners.iter() {
            listener.update_callback();
        }
        tracing::debug!("notified {} listeners", listeners.len());
    }
}
