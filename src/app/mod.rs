mod config;
mod error;
mod logging;
mod runtime;
pub mod services;

pub use error::AppError;

pub fn run() -> Result<(), AppError> {
    logging::init()?;

    let config = config::AppConfig::from_env()?;

    tracing::info!(
        db_path = %config.db_path,
        http_bind = %config.http_bind,
        cors_allowed_origins = ?config.cors_allowed_origins,
        upload_limit_bytes = config.upload_limit_bytes,
        "application bootstrap initialized"
    );

    runtime::run(config)
}
