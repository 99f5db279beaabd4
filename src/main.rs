//! Tamriel Library SSR server.
//!
//! Entry point: loads configuration, installs logging and runs the HTTP
//! front door until Ctrl-C.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;
use tracing::info;

use tamriel_ssr::config::AppConfig;
use tamriel_ssr::{server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before anything reads the environment
    let _ = dotenv();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err}");
            std::process::exit(1);
        }
    };

    telemetry::init(&config.log);

    info!(
        name: "config.loaded",
        mode = ?config.app.mode,
        template = %config.template_path().display(),
        data_api = %config.data_api.base_url,
        "Configuration loaded"
    );

    server::start_server(Arc::new(config)).await
}
