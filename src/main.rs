use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use log::{error, info};

use potability_api::routes::{self, ServerStatus};
use potability_api::{ModelInference, ServerConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    info!("Starting water potability prediction API");

    let config = ServerConfig::from_env().context("invalid server configuration")?;

    // No model, no server.
    let model = match ModelInference::load(&config.model_path, config.model_features) {
        Ok(model) => model,
        Err(e) => {
            error!("Failed to load model from {}: {}", config.model_path.display(), e);
            return Err(e).context("model artifact could not be loaded");
        }
    };

    let model_data = web::Data::new(model);
    let status = ServerStatus::now();
    let max_payload_bytes = config.max_payload_bytes;
    let bind_address = config.bind_address();

    info!("Listening on http://{}", bind_address);
    info!("Workers: {}", config.workers);
    info!("Endpoints:");
    info!("   POST /predict     - classify one feature vector");
    info!("   GET  /health      - liveness");
    info!("   GET  /model-info  - loaded model details");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .configure(routes::configure(model_data.clone(), status, max_payload_bytes))
            .default_service(web::route().to(routes::not_found))
    })
    .workers(config.workers)
    .bind(&bind_address)
    .with_context(|| format!("failed to bind {}", bind_address))?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
