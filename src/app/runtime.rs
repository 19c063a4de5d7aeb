use std::path::Path;
use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};

use crate::adapters::api::{ApiState, configure_routes, static_files};
use crate::adapters::db::{count_records, open_connection, run_migrations, schema_version};
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::app::services::SqliteEnergyService;

pub fn run(config: AppConfig) -> Result<(), AppError> {
    if let Some(parent) = Path::new(&config.db_path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(AppError::database_init)?;
    }

    let mut connection = open_connection(&config.db_path).map_err(AppError::database_init)?;
    run_migrations(&mut connection).map_err(AppError::database_init)?;

    tracing::info!(
        db_path = %config.db_path,
        schema_version = schema_version(&connection).map_err(AppError::database_init)?,
        records = count_records(&connection).map_err(AppError::database_init)?,
        "database ready"
    );

    let shared_connection = Arc::new(Mutex::new(connection));
    let api_state = ApiState {
        energy_service: SqliteEnergyService::new(shared_connection),
        upload_limit_bytes: config.upload_limit_bytes,
    };
    let cors_origins = config.cors_allowed_origins.clone();
    let json_limit = config.upload_limit_bytes;
    let static_dir = config.static_dir.clone();

    tracing::info!(
        bind = %config.http_bind,
        static_dir = static_dir.as_deref().unwrap_or("-"),
        "http server starting"
    );

    actix_web::rt::System::new()
        .block_on(async move {
            HttpServer::new(move || {
                App::new()
                    .wrap(build_cors(&cors_origins))
                    .wrap(middleware::Logger::default())
                    .app_data(web::Data::new(api_state.clone()))
                    .app_data(web::JsonConfig::default().limit(json_limit))
                    .configure(configure_routes)
                    .configure(|cfg| {
                        if let Some(dir) = &static_dir {
                            cfg.service(static_files(Path::new(dir)));
                        }
                    })
            })
            .bind(&config.http_bind)?
            .run()
            .await
        })
        .map_err(AppError::runtime)
}

fn build_cors(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allow_any_header()
        .expose_headers(vec![actix_web::http::header::CONTENT_DISPOSITION])
        .max_age(3600)
}
