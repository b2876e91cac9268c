//! # Static HTTP/1.0 Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor de archivos.
//!
//! ```bash
//! cargo run --release -- ./public 8080 --workers 8
//! ```
//!
//! Ctrl+C (SIGINT) o SIGTERM detienen el accept, drenan la cola y esperan
//! a todos los workers antes de salir.

use anyhow::Context;
use clap::Parser;
use static_server::config::Config;
use static_server::server::{Server, SignalListener};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filtro cuando no hay RUST_LOG ni --log-level
const DEFAULT_FILTER: &str = "static_server=info";

fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_level.as_deref())?;

    config.print_summary();

    let server = Server::bind(&config).context("server setup failed")?;
    let signals = SignalListener::spawn(server.shutdown_handle())?;

    info!(
        addr = %server.local_addr(),
        "static_server v{} ready, press Ctrl+C to stop",
        env!("CARGO_PKG_VERSION")
    );

    let result = server.run();
    signals.close();
    let report = result?;

    info!(
        processed = report.pool.total(),
        per_worker = ?report.pool.processed,
        "shutdown complete"
    );
    info!(stats = %report.stats.to_json(), "final stats");

    Ok(())
}

/// RUST_LOG tiene prioridad sobre --log-level / LOG_LEVEL
fn init_tracing(log_level: Option<&str>) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level.unwrap_or(DEFAULT_FILTER))
            .with_context(|| format!("invalid log filter {:?}", log_level))?,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_thread_names(true))
        .with(filter)
        .init();

    Ok(())
}
