//! # raw_http - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor HTTP/1.1.
//!
//! Lee la configuración (CLI + variables de entorno), inicializa el logging
//! y atiende conexiones con el handler de demostración hasta que el proceso
//! termine.

use raw_http::config::Config;
use raw_http::handlers::DemoHandler;
use raw_http::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "raw_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("raw_http v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::new();
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        std::process::exit(1);
    }
    config.log_summary();

    let handler = DemoHandler::from_config(&config);
    let server = match Server::bind(&config, handler) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(address = %config.address(), error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    // Bloquea el thread principal
    server.run();
}
