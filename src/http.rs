//! HTTP control plane: health, status, model reload, retrain.
//!
//! Handlers run concurrently with each other and with the scoring loop; all
//! of them go through the shared `ServiceState`, so an operator can hot-swap
//! the model or kick off training without interrupting scoring.

use crate::state::{ServiceState, StatusSnapshot};
use crate::trainer::Trainer;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared control-plane state
#[derive(Clone)]
pub struct AppState {
    pub state: Arc<ServiceState>,
    pub trainer: Arc<dyn Trainer>,
}

/// Build the control-plane router
pub fn router(app: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/reload", post(reload))
        .route("/retrain", post(retrain))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

/// Bind the control port and serve until the process exits.
///
/// A bind failure is returned to the caller and aborts startup; a control
/// plane that cannot listen leaves the operator with no way to manage the
/// service.
pub async fn serve(app: AppState, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Control plane listening");
    axum::serve(listener, router(app)).await?;
    Ok(())
}

/// Fixed liveness payload; touches no state
async fn health() -> Json<Value> {
    Json(json!({"status": "UP"}))
}

async fn status(State(app): State<AppState>) -> Json<StatusSnapshot> {
    Json(app.state.snapshot())
}

async fn reload(State(app): State<AppState>) -> (StatusCode, Json<Value>) {
    match app.state.reload(app.state.model_path()) {
        Ok(artifact) => {
            info!(model_version = %artifact.model_version, "Model reloaded");
            (
                StatusCode::OK,
                Json(json!({
                    "status": "reloaded",
                    "model_version": artifact.model_version,
                })),
            )
        }
        Err(e) => {
            error!(error = %e, "Model reload failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "error", "error": e.to_string()})),
            )
        }
    }
}

/// Kick off an asynchronous training run.
///
/// The handler returns immediately; the training task is fire-and-forget and
/// reports its outcome through the service state. While a run is in flight
/// every further retrain request is answered with "running" and starts
/// nothing.
async fn retrain(State(app): State<AppState>) -> (StatusCode, Json<Value>) {
    if !app.state.begin_training() {
        return (StatusCode::OK, Json(json!({"status": "running"})));
    }

    let state = app.state.clone();
    let trainer = app.trainer.clone();
    tokio::task::spawn_blocking(move || match trainer.train() {
        Ok(outcome) => {
            info!(
                model_version = %outcome.model_version,
                model_path = %outcome.model_path,
                "Training completed"
            );
            state.complete_training(Some(Path::new(&outcome.model_path)), None);
        }
        Err(e) => {
            error!(error = %e, "Training failed");
            state.complete_training(None, Some(e.to_string()));
        }
    });

    (StatusCode::OK, Json(json!({"status": "started"})))
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({"error": "not found"})))
}
