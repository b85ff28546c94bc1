//! CMS Migrate Main Entry Point
//!
//! Copies a WordPress site into the CMS schema: users, taxonomy, content,
//! media, comments, menus and settings. Every run starts from an empty target.

use std::env;

use cms_migrate::{AppConfig, Dependencies, MigrateError};
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cms_migrate=info,cms_migrate_pipeline=info,cms_migrate_repository=info"));

    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();

        info!(
            service_name = "cms-migrate",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();

        info!(
            service_name = "cms-migrate",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), MigrateError> {
    dotenv().ok();
    init_tracing();

    info!("Starting CMS migration");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    let deps = match Dependencies::new(config).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match deps.orchestrator.run().await {
        Ok(report) => {
            let failed = report.failed();
            if failed > 0 {
                warn!(failed, "Migration completed with row-level failures");
            } else {
                info!("Migration completed successfully");
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Migration failed");
            Err(e.into())
        }
    }
}
