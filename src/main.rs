//! W1000 to InfluxDB2 Forwarder
//!
//! This application maintains an authenticated session against the W1000
//! energy-metering portal, polls interval meter readings for the configured
//! reports, aggregates them into an hourly cumulative consumption series
//! and forwards the statistic points to InfluxDB2.
//!
//! # Architecture
//!
//! A single poll task runs one cycle per configured scan interval. Each
//! cycle logs in when the session is stale, fetches every report
//! independently, imports the aggregated statistics, and notifies the
//! registered entity listeners.
//!
//! # Features
//!
//! - Automatic re-login when the session expires
//! - Per-report failure isolation (one broken report never stops the rest)
//! - Automatic task restart after failure
//! - Graceful shutdown on SIGTERM/SIGINT
//! - Timeout protection for hung cycles

mod config;
mod error;
mod influxdb;
mod model;
mod w1000;

#[cfg(test)]
mod test_utils;

use crate::influxdb::StatisticsSink;
use crate::w1000::PortalClient;
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::signal::ctrl_c;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinError;
use tokio::time;
use tokio::time::{sleep, Duration};

/// Upper bound for one poll cycle; a cycle that exceeds it is abandoned
/// and retried on the next interval.
const POLL_CYCLE_TIMEOUT_SEC: u64 = 300;

/// Application entry point.
///
/// Initializes configuration and logging, builds the portal client and the
/// InfluxDB sink, and supervises the poll task with signal handling for
/// graceful shutdown.
#[tokio::main]
async fn main() {
    let (app_config, portal_config, influx_config) =
        config::load_all().expect("Failed to load configuration");
    tracing_subscriber::fmt()
        .with_max_level(app_config.log_level())
        .init();

    let sink: Arc<dyn StatisticsSink> = Arc::new(influxdb::Client::new(influx_config));
    let interval = Duration::from_secs(portal_config.scan_interval_min * 60);
    let portal = Arc::new(PortalClient::new(portal_config, sink));

    // Factory function so the task can be recreated after a failure
    let create_poll_task = || -> tokio::task::JoinHandle<()> {
        tokio::spawn(run_poll_cycle(
            Arc::clone(&portal),
            interval,
            POLL_CYCLE_TIMEOUT_SEC,
        ))
    };
    let mut poll_task = create_poll_task();

    let mut sig_term = signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
    tracing::info!("Running... Press Ctrl-C or send SIGTERM to terminate.");
    // Main event loop with signal handling and task supervision
    loop {
        tokio::select! {
            // Handle SIGTERM for graceful shutdown in containers
            _ = sig_term.recv() => {
                tracing::info!("Received SIGTERM. Exiting...");
                break;
            }
            // Handle Ctrl-C for manual termination
            _ = ctrl_c() => {
                tracing::info!("Received SIGINT. Exiting...");
                break;
            }
            // Monitor the poll task and restart it when it completes or fails
            result = &mut poll_task => {
                handle_task_result("poll_cycle", result);
                poll_task = create_poll_task();
            }
        }
    }
}

/// Runs one poll cycle under a timeout guard, then sleeps for the scan
/// interval. Cycle failures are absorbed inside the portal client; the
/// loop tolerates being woken at irregular times.
async fn run_poll_cycle(portal: Arc<PortalClient>, interval: Duration, timeout_seconds: u64) {
    with_timeout(
        "poll_cycle",
        async {
            portal.update().await;
        },
        timeout_seconds,
    )
    .await;
    sleep(interval).await;
}

/// Wraps a future with a timeout to prevent a cycle from hanging
/// indefinitely.
///
/// # Behavior
///
/// - Logs an error if the task times out but doesn't propagate the error
/// - Used to prevent the poll task from blocking the main loop
async fn with_timeout<F>(task_name: &'static str, future: F, timeout_seconds: u64)
where
    F: IntoFuture,
{
    let timeout_duration = Duration::from_secs(timeout_seconds);

    match time::timeout(timeout_duration, future).await {
        Ok(_) => {}
        Err(_) => tracing::error!("Task {} timed out.", task_name),
    }
}

/// Handles the result of a tokio task, logging success or failure.
///
/// Success is logged at debug level; failures (panics, cancellation) at
/// error level, right before the main loop restarts the task.
fn handle_task_result(task_name: &str, result: Result<(), JoinError>) {
    match result {
        Ok(_) => {
            tracing::debug!("Task {} completed.", task_name);
        }
        Err(e) => {
            tracing::error!("Task {} failed: {:?}", task_name, e);
        }
    }
}
