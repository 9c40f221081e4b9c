//! # Dashboard Server
//!
//! HTTP front end for the analysis: serves the dashboard page, accepts CSV
//! uploads and exposes the computed dashboard as JSON. One [`Session`] is
//! shared by every client of a server instance.

mod routes;

pub use routes::{ApiError, router as dashboard_router, run as run_dashboard};

use crate::config::GpulensConfig;
use crate::dashboard::{LoadedDataset, Session};
use crate::error::{LoadError, StatsError};
use crate::summary::Percentile;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Thread-safe shared state reference for axum handlers.
pub type SharedState = Arc<Mutex<AppState>>;

/// Mutable server state.
#[derive(Debug)]
pub struct AppState {
    config: GpulensConfig,
    session: Session,
    /// Diagnostic text of the last rejected upload, shown on the page.
    last_error: Option<String>,
    started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: GpulensConfig) -> Self {
        Self {
            config,
            session: Session::default(),
            last_error: None,
            started_at: Utc::now(),
        }
    }

    /// Wrap into the shared handle the router expects.
    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &GpulensConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Install a freshly parsed dataset, discarding the previous one.
    pub fn accept_upload(&mut self, dataset: LoadedDataset) {
        self.last_error = None;
        self.session.replace(dataset);
    }

    /// Record a failed upload. The previous dataset is dropped as well.
    pub fn reject_upload(&mut self, error: &LoadError) {
        self.session.clear();
        self.last_error = Some(error_chain(error));
    }

    pub fn reset(&mut self) {
        self.session.clear();
        self.last_error = None;
    }

    /// Requested percentile, or the configured default.
    pub fn resolve_percentile(&self, requested: Option<i64>) -> Result<Percentile, StatsError> {
        let value = requested.unwrap_or(i64::from(self.config.analysis.default_percentile));
        Percentile::new(value)
    }

    pub fn uptime_secs(&self) -> u64 {
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_seconds().max(0) as u64
    }
}

/// Render an error and each of its sources, one per line.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str("\ncaused by: ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
