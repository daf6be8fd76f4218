#[macro_use]
extern crate tracing;
extern crate serde_json;

use std::error::Error;
use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::error::JsonPayloadError;
use anyhow::Context;
use actix_web::web::Data;
use actix_web::{web, App};
use actix_web::{HttpResponse, HttpServer};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;

use spendguard_lib::config::Config;
use spendguard_lib::{catalog, health, transaction};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let subscriber = registry::Registry::default()
        .with(LevelFilter::INFO)
        .with(tracing_subscriber::fmt::Layer::default());
    tracing::subscriber::set_global_default(subscriber).expect("set up subscriber");
    info!("tracing initialized");

    let config = match get_config_file() {
        Ok(config_path) => Config::from_file(config_path).context("Unable to load config file")?,
        Err(_) => Config::from_env().context("Unable to load config from environment")?,
    };
    spendguard_lib::set_development_mode(config.development);

    let (transaction_repo, catalog_repo, health_check) =
        spendguard_repo::sqlx_repo::create_repos(&config.database_url, config.max_pool_size)
            .await
            .context("Unable to set up storage")?;

    let frontend_url = config.frontend_url.clone();
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_url)
            .allow_any_method()
            .allow_any_header();
        App::new()
            .app_data(Data::new(transaction_repo.clone()))
            .app_data(Data::new(catalog_repo.clone()))
            .app_data(Data::new(health_check.clone()))
            .wrap(cors)
            .wrap(spendguard_lib::tracing::create_middleware())
            .service(health::health_service())
            .service(
                web::scope("/api")
                    .service(transaction::transaction_service())
                    .service(catalog::category_service())
                    .service(catalog::account_service())
                    .service(catalog::tag_service()),
            )
            .app_data(web::JsonConfig::default().error_handler(|err, req| {
                error!(req_path = req.path(), %err);
                match err {
                    JsonPayloadError::Deserialize(deserialize_err) => {
                        let error_body = serde_json::json!({
                            "error": "Unable to parse JSON payload",
                            "detail": format!("{}", deserialize_err),
                        });
                        actix_web::error::InternalError::from_response(
                            deserialize_err,
                            HttpResponse::BadRequest()
                                .content_type("application/json")
                                .body(error_body.to_string()),
                        )
                        .into()
                    }
                    _ => err.into(),
                }
            }))
    });

    info!(port = config.port, "Starting server");
    server.bind(("0.0.0.0", config.port))?.run().await?;

    Ok(())
}

fn get_config_file() -> Result<PathBuf, &'static str> {
    let config_current_dir = PathBuf::from("config.toml");
    if config_current_dir.exists() {
        return Ok(config_current_dir);
    }
    if let Ok(config_env) = std::env::var("CONFIGURATION_DIRECTORY") {
        let config_path = PathBuf::from(config_env).join("config.toml");
        if config_path.exists() {
            return Ok(config_path);
        }
    }

    Err("Config file not found")
}
