//! Routes and handlers of the dashboard server, built on axum.

use super::{SharedState, error_chain};
use crate::dashboard::{LoadedDataset, build_dashboard};
use crate::error::{LoadError, StatsError};
use crate::render::{PageContext, render_dashboard_page};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Error body returned by the JSON endpoints.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    detail: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<StatsError> for ApiError {
    fn from(e: StatsError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: e.to_string(),
            detail: None,
        }
    }
}

impl From<&LoadError> for ApiError {
    fn from(e: &LoadError) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "CSV file could not be read".to_string(),
            detail: Some(error_chain(e)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
            "detail": self.detail,
        });
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct PercentileQuery {
    percentile: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct UploadQuery {
    name: Option<String>,
}

/// Build the axum Router serving the page and the JSON API.
pub fn router(shared: SharedState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/upload", post(upload_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/session", delete(reset_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Dashboard page.
async fn index_handler(
    State(state): State<SharedState>,
    Query(query): Query<PercentileQuery>,
) -> Result<Html<String>, ApiError> {
    let (percentile, dataset, error) = {
        let state = state.lock().await;
        (
            state.resolve_percentile(query.percentile)?,
            state.session().dataset().cloned(),
            state.last_error().map(str::to_string),
        )
    };

    let dashboard = dataset
        .as_ref()
        .map(|d| build_dashboard(&d.table, percentile));
    let page = render_dashboard_page(&PageContext {
        percentile,
        loaded: dataset.as_ref().zip(dashboard.as_ref()),
        error: error.as_deref(),
    });
    Ok(Html(page))
}

/// Health check endpoint.
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.lock().await;
    let session = match state.session().dataset() {
        Some(_) => "loaded",
        None => "no_data",
    };
    let body = serde_json::json!({
        "status": "ok",
        "state": session,
        "uptime_secs": state.uptime_secs(),
    });
    Json(body)
}

/// Replace the session with the uploaded CSV body.
async fn upload_handler(
    State(state): State<SharedState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let name = query.name.unwrap_or_else(|| "upload.csv".to_string());

    match LoadedDataset::from_bytes(name.as_str(), &body) {
        Ok(dataset) => {
            tracing::info!(
                name = %name,
                bytes = body.len(),
                rows = dataset.report.rows_kept,
                skipped = dataset.report.rows_skipped,
                "CSV upload accepted"
            );
            let response = serde_json::json!({
                "id": dataset.id,
                "name": dataset.name,
                "loaded_at": dataset.loaded_at,
                "report": dataset.report,
            });
            state.lock().await.accept_upload(dataset);
            Ok(Json(response))
        }
        Err(e) => {
            tracing::warn!(name = %name, error = %e, "CSV upload rejected");
            let api_error = ApiError::from(&e);
            state.lock().await.reject_upload(&e);
            Err(api_error)
        }
    }
}

/// The computed dashboard as JSON.
async fn dashboard_handler(
    State(state): State<SharedState>,
    Query(query): Query<PercentileQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (percentile, dataset) = {
        let state = state.lock().await;
        (
            state.resolve_percentile(query.percentile)?,
            state.session().dataset().cloned(),
        )
    };

    let Some(dataset) = dataset else {
        return Ok(Json(serde_json::json!({ "state": "no_data" })));
    };

    let dashboard = build_dashboard(&dataset.table, percentile);
    Ok(Json(serde_json::json!({
        "state": "loaded",
        "dataset": {
            "id": dataset.id,
            "name": dataset.name,
            "loaded_at": dataset.loaded_at,
            "report": dataset.report,
        },
        "dashboard": dashboard,
    })))
}

/// Drop the loaded dataset.
async fn reset_handler(State(state): State<SharedState>) -> StatusCode {
    state.lock().await.reset();
    tracing::info!("Session reset");
    StatusCode::NO_CONTENT
}

/// Start the dashboard server on the configured address.
///
/// Runs until the listener fails or the task is cancelled.
pub async fn run(shared: SharedState) -> Result<(), std::io::Error> {
    let (host, port, max_upload_bytes) = {
        let state = shared.lock().await;
        let server = &state.config().server;
        (server.host.clone(), server.port, server.max_upload_bytes)
    };
    let app = router(shared, max_upload_bytes);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Dashboard listening");
    axum::serve(listener, app).await?;
    Ok(())
}
