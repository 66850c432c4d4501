use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::error::{ApiError, Result};
use crate::inference::ModelInference;
use crate::models::{FeatureVector, HealthResponse, PredictionRequest, PredictionResponse};

/// Process-level facts reported by `/health`.
#[derive(Debug, Clone, Copy)]
pub struct ServerStatus {
    pub started_at: DateTime<Utc>,
}

impl ServerStatus {
    pub fn now() -> Self {
        Self { started_at: Utc::now() }
    }
}

/// Register the prediction routes together with the shared model and the JSON
/// extractor settings. The model is cloned per worker as an `Arc`, never reloaded.
pub fn configure(
    model: web::Data<ModelInference>,
    status: ServerStatus,
    max_payload_bytes: usize,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(model)
            .app_data(web::Data::new(status))
            .app_data(json_config(max_payload_bytes))
            .service(
                web::resource("/predict")
                    .route(web::post().to(predict))
                    .default_service(web::to(method_not_allowed)),
            )
            .service(
                web::resource("/health")
                    .route(web::get().to(health_check))
                    .default_service(web::to(method_not_allowed)),
            )
            .service(
                web::resource("/model-info")
                    .route(web::get().to(model_info))
                    .default_service(web::to(method_not_allowed)),
            );
    }
}

/// Bodies are parsed as JSON whatever their `Content-Type`; parse failures
/// become 4xx responses with a JSON error body.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .content_type(|_| true)
        .content_type_required(false)
        .error_handler(json_error)
}

fn json_error(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    let api_error = match &err {
        JsonPayloadError::Deserialize(e) if e.is_data() => {
            ApiError::BadRequest(format!("invalid prediction request: {}", e))
        }
        JsonPayloadError::Deserialize(e) => {
            ApiError::BadRequest(format!("request body is not valid JSON: {}", e))
        }
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            ApiError::PayloadTooLarge(err.to_string())
        }
        _ => ApiError::BadRequest(err.to_string()),
    };
    warn!("Rejected request to {}: {}", req.path(), api_error);
    api_error.into()
}

async fn predict(
    model: web::Data<ModelInference>,
    req: web::Json<PredictionRequest>,
) -> Result<HttpResponse> {
    let features = FeatureVector::try_from(req.into_inner())?;
    info!("Prediction request received ({} features)", features.len());

    let model = model.clone();
    let prediction = web::block(move || model.predict(&features))
        .await
        .map_err(|e| ApiError::Internal(format!("inference task failed: {}", e)))??;

    info!("Prediction: {}", prediction);
    Ok(HttpResponse::Ok().json(PredictionResponse { prediction }))
}

async fn health_check(status: web::Data<ServerStatus>) -> HttpResponse {
    let uptime = Utc::now().signed_duration_since(status.started_at);
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: true,
        started_at: status.started_at,
        uptime_secs: uptime.num_seconds(),
    })
}

async fn model_info(model: web::Data<ModelInference>) -> HttpResponse {
    HttpResponse::Ok().json(model.get_model_info())
}

async fn method_not_allowed() -> Result<HttpResponse> {
    Err(ApiError::MethodNotAllowed)
}

/// Fallback for unknown routes.
pub async fn not_found() -> Result<HttpResponse> {
    Err(ApiError::NotFound)
}
