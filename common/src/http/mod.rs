//! HTTP front end for the query pipeline.
//!
//! - POST /query - `{"question": "..."}` to `{"sql": "...", "results": [...]}`
//! - POST /schema/refresh - re-read the catalog
//! - GET /health - liveness

pub mod handlers;
pub mod models;

use crate::agent::QueryPipeline;
use crate::error::Result;
use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handlers::json_error_handler))
        .service(handlers::query_handler)
        .service(handlers::refresh_schema_handler)
        .service(handlers::health_handler);
}

/// serve until the process is stopped; each request runs on its own task
pub async fn serve(bind_addr: &str, pipeline: Arc<QueryPipeline>) -> Result<()> {
    let data = web::Data::from(pipeline);

    tracing::info!("starting http server on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            // the browser front end is served from another origin
            .wrap(Cors::permissive())
            .app_data(data.clone())
            .configure(configure_routes)
    })
    .bind(bind_addr)?
    .run()
    .await?;

    tracing::info!("http server stopped");
    Ok(())
}
