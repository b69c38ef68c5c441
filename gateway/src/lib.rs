pub mod api;
pub mod backend;
pub mod config;
pub mod document;
pub mod metrics_defs;
pub mod operations;
pub mod outcome;
pub mod validation;

#[cfg(test)]
mod testutils;

use backend::BackendError;
use operations::Operations;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] config::ValidationError),
    #[error("backend setup failed: {0}")]
    Backend(#[from] BackendError),
}

/// Runs the document API and the admin listener until either of them fails.
pub async fn run(config: config::Config) -> Result<(), GatewayError> {
    config.validate()?;

    let factory = backend::factory::from_config(&config.backend)?;
    let operations = Operations::new(factory, config.insert_timeout());

    let ready = Arc::new(AtomicBool::new(false));
    let ready_probe = ready.clone();
    let admin_service =
        AdminService::<_, GatewayError>::new(move || ready_probe.load(Ordering::Acquire));

    tracing::info!(
        backend = %config.backend.url,
        strategy = ?config.backend.strategy,
        "Starting gateway"
    );

    let api_task = api::serve(&config.listener, operations, ready);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(api_task, admin_task)?;
    Ok(())
}
