//! # Twilio Guard Service
//!
//! Binary entry point for the Twilio webhook validation service.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes logging
//! - Builds the webhook validation middleware from the `twilio` namespace
//! - Starts the HTTP server from twilio-guard-api

use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twilio_guard_api::{
    start_server, LoggingConfig, ServiceConfig, ServiceError, WebhookValidationMiddleware,
};

const EXIT_CONFIGURATION: i32 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();

    let logging: LoggingConfig = settings
        .as_ref()
        .ok()
        .and_then(|s| s.get("logging").ok())
        .unwrap_or_default();
    init_logging(&logging);

    info!("Starting Twilio Guard service");

    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to build configuration; aborting");
            std::process::exit(EXIT_CONFIGURATION);
        }
    };

    let service_config: ServiceConfig = match settings.clone().try_deserialize() {
        Ok(sc) => sc,
        Err(e) => {
            error!(
                error = %e,
                "Could not deserialize service configuration; aborting. \
                 Fix the configuration and restart."
            );
            std::process::exit(EXIT_CONFIGURATION);
        }
    };

    if let Err(e) = service_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(EXIT_CONFIGURATION);
    }

    // The raw tree keeps strings as strings, so numeric-looking tokens survive.
    let tree: Value = match settings.try_deserialize() {
        Ok(tree) => tree,
        Err(e) => {
            error!(error = %e, "Could not read configuration tree; aborting");
            std::process::exit(EXIT_CONFIGURATION);
        }
    };

    let webhook_validation = match WebhookValidationMiddleware::from_settings(&tree) {
        Ok(m) => m,
        Err(e) => {
            error!(
                error = %e,
                "Twilio webhook validation cannot be configured; refusing to serve traffic"
            );
            std::process::exit(EXIT_CONFIGURATION);
        }
    };

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        endpoint = %service_config.webhooks.endpoint_path,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(service_config, webhook_validation).await {
        error!("Failed to start server: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => EXIT_CONFIGURATION,
        };

        std::process::exit(exit_code);
    }

    Ok(())
}

/// Build the settings tree.
///
/// Sources (applied in order; later sources override earlier ones):
///  1. /etc/twilio-guard/service.yaml
///  2. ./config/service.yaml
///  3. Path given by `TWILIO_GUARD_CONFIG_FILE`
///  4. Environment variables prefixed `TG__`, e.g. `TG__TWILIO__AUTH_TOKEN`
///
/// Missing files are fine; a malformed file is not.
fn load_settings() -> Result<config::Config, config::ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(
            config::File::with_name("/etc/twilio-guard/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name("config/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    if let Ok(explicit_path) = std::env::var("TWILIO_GUARD_CONFIG_FILE") {
        if !explicit_path.is_empty() {
            builder = builder.add_source(
                config::File::with_name(&explicit_path)
                    .required(true)
                    .format(config::FileFormat::Yaml),
            );
        }
    }

    builder
        .add_source(
            config::Environment::with_prefix("TG")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
}

fn init_logging(logging: &LoggingConfig) {
    let default_filter = format!(
        "twilio_guard_service={level},twilio_guard_api={level},twilio_guard_core={level},tower_http=debug",
        level = logging.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json_format {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
