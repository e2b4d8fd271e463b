//! HTTP prediction service.
//!
//! A stateless wrapper around the fitted pipeline and classifier: both are
//! loaded once at startup into [`AppState`], shared read-only across
//! request handlers. One scoring route, one informational route. A
//! malformed request is a client error; it never takes the service down.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::models::Classifier;
use crate::pipeline::FeaturePipeline;
use crate::types::transaction::Transaction;

/// Process-lifetime state, constructed once in `main` and passed into
/// handlers explicitly. Both artifacts are immutable after load.
pub struct AppState {
    pub pipeline: FeaturePipeline,
    pub classifier: Box<dyn Classifier>,
}

impl AppState {
    pub fn new(pipeline: FeaturePipeline, classifier: Box<dyn Classifier>) -> Self {
        Self {
            pipeline,
            classifier,
        }
    }
}

/// Response body for the scoring endpoint.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// 0 = legitimate, 1 = fraud.
    pub prediction: i64,
}

/// Build the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Fraud scoring service listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Static service information.
async fn home() -> Json<serde_json::Value> {
    Json(json!({
        "service": "fraud-scoring",
        "endpoints": { "predict": "POST /predict" },
    }))
}

/// Score a single transaction.
///
/// The body is a raw transaction record (label optional, ignored). The row
/// runs through the fitted pipeline as a single-row batch, then through the
/// classifier. Transform failures map to 400; only classifier failures are
/// a 500.
async fn predict(
    State(state): State<Arc<AppState>>,
    Json(transaction): Json<Transaction>,
) -> Result<Json<PredictResponse>, (StatusCode, String)> {
    let tx_id = transaction.transaction_id.clone();

    let matrix = state.pipeline.transform(&[transaction]).map_err(|e| {
        debug!(transaction_id = %tx_id, error = %e, "Transform rejected request");
        let status = if e.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, e.to_string())
    })?;

    let predictions = state
        .classifier
        .predict(&matrix.to_f32_rows())
        .map_err(|e| {
            error!(transaction_id = %tx_id, error = %e, "Inference failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "inference failed".to_string())
        })?;

    let prediction = *predictions.first().ok_or_else(|| {
        error!(transaction_id = %tx_id, "Classifier returned no prediction");
        (StatusCode::INTERNAL_SERVER_ERROR, "inference failed".to_string())
    })?;

    debug!(transaction_id = %tx_id, prediction, "Transaction scored");
    Ok(Json(PredictResponse { prediction }))
}
