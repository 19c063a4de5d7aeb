use std::path::Path;

use actix_files::Files;
use actix_multipart::{Multipart, MultipartError};
use actix_web::http::header::{self, ContentType};
use actix_web::{HttpResponse, Responder, delete, get, post, put, web};
use futures_util::{StreamExt, TryStreamExt};
use thiserror::Error;

use crate::adapters::dto::{
    CompareQuery, EnergyRecordPayload, EnergyRecordResponse, FilterQuery, PayloadError,
    parse_import_file, to_responses,
};
use crate::app::services::{
    EnergyCommandHandler, EnergyQueryHandler, ServiceError, SqliteEnergyService,
};

const EXPORT_DISPOSITION: &str = "attachment; filename=\"energy_data.json\"";
const INVALID_UPLOAD_MESSAGE: &str = "Please upload a valid JSON file.";
const UPLOAD_FIELD_NAME: &str = "file";

#[derive(Clone)]
pub struct ApiState {
    pub energy_service: SqliteEnergyService,
    pub upload_limit_bytes: usize,
}

#[derive(Debug, Error)]
enum UploadError {
    #[error("no JSON file in upload")]
    InvalidFile,
    #[error("uploaded file exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("malformed multipart payload: {0}")]
    Multipart(#[from] MultipartError),
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // fixed paths before `/energy/{id}`
    cfg.service(health)
        .service(list_records_endpoint)
        .service(create_record_endpoint)
        .service(download_json_endpoint)
        .service(upload_json_endpoint)
        .service(compare_endpoint)
        .service(filter_endpoint)
        .service(get_record_endpoint)
        .service(update_record_endpoint)
        .service(delete_record_endpoint);
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[get("/energy/")]
async fn list_records_endpoint(state: web::Data<ApiState>) -> impl Responder {
    match state.energy_service.list() {
        Ok(records) => HttpResponse::Ok().json(to_responses(records)),
        Err(error) => service_error_response(error),
    }
}

#[post("/energy/new")]
async fn create_record_endpoint(
    state: web::Data<ApiState>,
    body: web::Json<EnergyRecordPayload>,
) -> impl Responder {
    let draft = match body.into_inner().into_draft() {
        Ok(draft) => draft,
        Err(error) => return payload_error_response(error),
    };

    match state.energy_service.save(&draft) {
        Ok(record) => HttpResponse::Ok().json(EnergyRecordResponse::from(record)),
        Err(error) => service_error_response(error),
    }
}

#[get("/energy/download/json")]
async fn download_json_endpoint(state: web::Data<ApiState>) -> impl Responder {
    match state.energy_service.list() {
        Ok(records) => HttpResponse::Ok()
            .insert_header((header::CONTENT_DISPOSITION, EXPORT_DISPOSITION))
            .json(to_responses(records)),
        Err(error) => service_error_response(error),
    }
}

#[post("/energy/upload")]
async fn upload_json_endpoint(state: web::Data<ApiState>, payload: Multipart) -> impl Responder {
    let bytes = match read_json_file(payload, state.upload_limit_bytes).await {
        Ok(bytes) => bytes,
        Err(UploadError::TooLarge { limit }) => {
            return HttpResponse::PayloadTooLarge()
                .content_type(ContentType::plaintext())
                .body(format!("Uploaded file exceeds {limit} bytes."));
        }
        Err(error) => {
            tracing::warn!(error = %error, "rejected energy data upload");
            return HttpResponse::BadRequest()
                .content_type(ContentType::plaintext())
                .body(INVALID_UPLOAD_MESSAGE);
        }
    };

    let drafts = match parse_import_file(&bytes) {
        Ok(drafts) => drafts,
        Err(error) => return upload_failure_response(error),
    };

    match state.energy_service.import(&drafts) {
        Ok(_) => HttpResponse::Ok()
            .content_type(ContentType::plaintext())
            .body("Data uploaded successfully."),
        Err(error) => upload_failure_response(error),
    }
}

#[get("/energy/compare")]
async fn compare_endpoint(
    state: web::Data<ApiState>,
    query: web::Query<CompareQuery>,
) -> impl Responder {
    match state
        .energy_service
        .get_data_between_dates(query.start_date, query.end_date)
    {
        Ok(records) => HttpResponse::Ok().json(to_responses(records)),
        Err(error) => service_error_response(error),
    }
}

#[get("/energy/filter")]
async fn filter_endpoint(
    state: web::Data<ApiState>,
    query: web::Query<FilterQuery>,
) -> impl Responder {
    let filter = match query.into_inner().into_filter() {
        Ok(filter) => filter,
        Err(error) => return payload_error_response(error),
    };

    match state.energy_service.filter(&filter) {
        Ok(records) => HttpResponse::Ok().json(to_responses(records)),
        Err(error) => service_error_response(error),
    }
}

#[get("/energy/{id}")]
async fn get_record_endpoint(state: web::Data<ApiState>, path: web::Path<i64>) -> impl Responder {
    match state.energy_service.get(path.into_inner()) {
        Ok(record) => HttpResponse::Ok().json(EnergyRecordResponse::from(record)),
        Err(error) => service_error_response(error),
    }
}

#[put("/energy/{id}")]
async fn update_record_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<i64>,
    body: web::Json<EnergyRecordPayload>,
) -> impl Responder {
    let update = match body.into_inner().into_update() {
        Ok(update) => update,
        Err(error) => return payload_error_response(error),
    };

    match state.energy_service.update(path.into_inner(), &update) {
        Ok(record) => HttpResponse::Ok().json(EnergyRecordResponse::from(record)),
        Err(error) => service_error_response(error),
    }
}

#[delete("/energy/{id}")]
async fn delete_record_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<i64>,
) -> impl Responder {
    match state.energy_service.delete(path.into_inner()) {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(error) => service_error_response(error),
    }
}

/// Reads the `file` part of the upload. Other parts are drained and ignored.
async fn read_json_file(mut payload: Multipart, limit: usize) -> Result<Vec<u8>, UploadError> {
    while let Some(field) = payload.next().await {
        let mut field = field?;
        let is_upload_field = field.name() == Some(UPLOAD_FIELD_NAME);
        let is_json = field
            .content_type()
            .is_some_and(|mime| mime.essence_str() == "application/json");

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if !is_upload_field {
                continue;
            }
            if bytes.len() + chunk.len() > limit {
                return Err(UploadError::TooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }

        if !is_upload_field {
            continue;
        }
        if !is_json || bytes.is_empty() {
            return Err(UploadError::InvalidFile);
        }

        return Ok(bytes);
    }

    Err(UploadError::InvalidFile)
}

/// Serves the dashboard front-end from `dir`. Mount after [`configure_routes`].
pub fn static_files(dir: &Path) -> Files {
    Files::new("/", dir).index_file("index.html")
}

fn upload_failure_response(error: impl std::fmt::Display) -> HttpResponse {
    tracing::warn!(error = %error, "energy data upload failed");
    HttpResponse::InternalServerError()
        .content_type(ContentType::plaintext())
        .body(format!("Error processing file: {error}"))
}

fn payload_error_response(error: PayloadError) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": error.to_string()
    }))
}

fn service_error_response(error: ServiceError) -> HttpResponse {
    match error {
        ServiceError::NotFound { .. } => HttpResponse::NotFound().json(serde_json::json!({
            "error": error.to_string()
        })),
        ServiceError::DbLockPoisoned => {
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "database lock poisoned"
            }))
        }
        ServiceError::Database(error) => {
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": error.to_string()
            }))
        }
    }
}
