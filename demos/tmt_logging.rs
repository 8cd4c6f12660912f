//! Bootstraps logging from `demos/logging.json`.
//!
//! Run with:
//! ```bash
//! TMT_LOG_HOME=/tmp cargo run --example tmt_logging
//! ```

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let handle = tmtlog::builder()
        .with_config_path("demos/logging.json")
        .init()?;

    tracing::info!(files = ?handle.files(), "This is the logger configured from logging.json");
    tracing::debug!("Debug records only reach the file handler");
    tracing::warn!(error_code = 404, path = "/api/users", "Resource not found");

    let span = tracing::info_span!("request_handler", request_id = "req-xyz-789");
    let _enter = span.enter();
    tracing::info!("Processing request");

    Ok(())
}
