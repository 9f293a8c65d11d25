use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderValue, Method},
    routing::{delete, get, post},
};
use classifier::{InferenceBackend, PredictionResult};
use records::{
    ClassificationRecord, NewClassification, Statistics, Timeframe, TimeframeStatistics,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};

const IMAGE_FIELD: &str = "image";
const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/jpg"];
/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TimeframeQuery {
    pub timeframe: Option<String>,
}

pub fn build_router<B>(state: AppState<B>) -> anyhow::Result<Router>
where
    B: InferenceBackend + 'static,
{
    let origin = HeaderValue::from_str(&state.config.cors_origin).map_err(|e| {
        anyhow::anyhow!("invalid CORS origin '{}': {}", state.config.cors_origin, e)
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let api = Router::new()
        .route("/predict", post(predict::<B>))
        .route("/history", get(history::<B>))
        .route("/history/clear", delete(clear_history::<B>))
        .route("/history/:id", delete(delete_classification::<B>))
        .route("/statistics", get(statistics::<B>))
        .route("/statistics/timeframe", get(timeframe_statistics::<B>))
        .route("/health", get(health::<B>));

    Ok(Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state))
}

struct Upload {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

/// Pulls the `image` field out of the form and applies the upload rules.
async fn read_image_field(multipart: &mut Multipart, max_bytes: usize) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_lowercase);
        if !content_type
            .as_deref()
            .is_some_and(|ct| ALLOWED_CONTENT_TYPES.contains(&ct))
        {
            return Err(ApiError::bad_request("Only JPEG/PNG images are allowed"));
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|_| {
            ApiError::bad_request(format!("File size must be less than {} bytes", max_bytes))
        })?;

        if bytes.is_empty() {
            return Err(ApiError::bad_request("No file uploaded"));
        }
        if bytes.len() > max_bytes {
            return Err(ApiError::bad_request(format!(
                "File size must be less than {} bytes",
                max_bytes
            )));
        }

        return Ok(Upload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::bad_request("No file uploaded"))
}

#[tracing::instrument(name = "POST /api/predict", skip_all)]
async fn predict<B>(
    State(state): State<AppState<B>>,
    mut multipart: Multipart,
) -> Result<Json<PredictionResult>, ApiError>
where
    B: InferenceBackend + 'static,
{
    let upload = read_image_field(&mut multipart, state.config.max_upload_bytes).await?;
    tracing::debug!(
        file_name = upload.file_name.as_deref().unwrap_or(""),
        bytes = upload.bytes.len(),
        "Image received"
    );

    let started = Instant::now();
    let handle = state.classifier.clone();
    let bytes = upload.bytes;
    let task = tokio::task::spawn_blocking(move || handle.predict(&bytes));

    let joined = match state.config.predict_timeout {
        Some(deadline) => match tokio::time::timeout(deadline, task).await {
            Ok(joined) => joined,
            Err(_) => {
                state.metrics.record_failure("timeout");
                return Err(ApiError::timeout(format!(
                    "Prediction did not finish within {} ms",
                    deadline.as_millis()
                )));
            }
        },
        None => task.await,
    };

    let outcome = joined.map_err(|e| {
        state.metrics.record_failure("panic");
        ApiError::internal(format!("Prediction task failed: {}", e))
    })?;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            state.metrics.record_failure(failure_reason(&e));
            return Err(e.into());
        }
    };

    state
        .metrics
        .record_success(started.elapsed(), result.predicted_class());

    let record = state.store.save(NewClassification::new(
        result.predicted_class(),
        result.confidence(),
        upload.file_name,
        result.all_scores().iter().cloned(),
    ))?;

    tracing::info!(
        id = record.id,
        predicted_class = result.predicted_class(),
        confidence = result.confidence(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Image classified"
    );

    Ok(Json(result))
}

fn failure_reason(err: &classifier::ClassifierError) -> &'static str {
    match err {
        classifier::ClassifierError::Decode(_) => "decode",
        classifier::ClassifierError::Inference(_) => "inference",
        classifier::ClassifierError::NotInitialized => "not_initialized",
        classifier::ClassifierError::Configuration(_) => "configuration",
    }
}

#[tracing::instrument(name = "GET /api/history", skip_all)]
async fn history<B>(
    State(state): State<AppState<B>>,
) -> Result<Json<Vec<ClassificationRecord>>, ApiError> {
    Ok(Json(state.store.list_recent()?))
}

#[tracing::instrument(name = "DELETE /api/history/:id", skip_all, fields(id = id))]
async fn delete_classification<B>(
    State(state): State<AppState<B>>,
    Path(id): Path<u64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.store.delete(id)?;
    Ok(Json(MessageResponse {
        message: "Classification deleted successfully".to_string(),
    }))
}

#[tracing::instrument(name = "DELETE /api/history/clear", skip_all)]
async fn clear_history<B>(
    State(state): State<AppState<B>>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.store.clear()?;
    Ok(Json(MessageResponse {
        message: "All history cleared successfully".to_string(),
    }))
}

#[tracing::instrument(name = "GET /api/statistics", skip_all)]
async fn statistics<B>(State(state): State<AppState<B>>) -> Result<Json<Statistics>, ApiError> {
    Ok(Json(records::statistics(state.store.as_ref())?))
}

#[tracing::instrument(name = "GET /api/statistics/timeframe", skip_all)]
async fn timeframe_statistics<B>(
    State(state): State<AppState<B>>,
    Query(query): Query<TimeframeQuery>,
) -> Result<Json<TimeframeStatistics>, ApiError> {
    let timeframe = query
        .timeframe
        .as_deref()
        .map(Timeframe::parse)
        .unwrap_or(Timeframe::All);

    Ok(Json(records::timeframe_statistics(
        state.store.as_ref(),
        timeframe,
        chrono::Utc::now(),
    )?))
}

#[tracing::instrument(name = "GET /api/health", skip_all)]
async fn health<B>(State(state): State<AppState<B>>) -> Json<HealthResponse>
where
    B: InferenceBackend,
{
    let status = if state.classifier.is_ready() {
        "ready"
    } else {
        "loading"
    };

    Json(HealthResponse {
        status: status.to_string(),
    })
}
