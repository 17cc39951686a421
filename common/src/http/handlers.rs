use super::models::{ErrorResponse, HealthResponse, QueryRequest, RefreshResponse};
use crate::agent::QueryPipeline;
use crate::error::TalkDbError;
use actix_web::{error, get, post, web, HttpRequest, HttpResponse, Responder};

/// per-request failures are the caller's problem, config faults are ours
pub fn error_response(err: &TalkDbError) -> HttpResponse {
    let body = ErrorResponse::from(err);
    if err.is_client_visible() {
        HttpResponse::BadRequest().json(body)
    } else {
        tracing::error!(error = %err, "server misconfiguration");
        HttpResponse::InternalServerError().json(body)
    }
}

/// POST /query - answer a plain-language question
#[post("/query")]
pub async fn query_handler(
    pipeline: web::Data<QueryPipeline>,
    body: web::Json<QueryRequest>,
) -> impl Responder {
    let question = body.question.as_deref().unwrap_or_default();

    match pipeline.run(question).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(err) => error_response(&err),
    }
}

/// GET /health - static liveness indicator
#[get("/health")]
pub async fn health_handler() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse::ok())
}

/// POST /schema/refresh - re-read the catalog into the cache
#[post("/schema/refresh")]
pub async fn refresh_schema_handler(pipeline: web::Data<QueryPipeline>) -> impl Responder {
    match pipeline.refresh_schema().await {
        Ok(schema) => HttpResponse::Ok().json(RefreshResponse {
            tables: schema.description.len(),
        }),
        Err(err) => error_response(&err),
    }
}

/// malformed bodies get the same json error shape as pipeline failures
pub fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> error::Error {
    let body = ErrorResponse {
        error: format!("invalid request body: {}", err),
        kind: "invalid_input".to_string(),
    };
    error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}
