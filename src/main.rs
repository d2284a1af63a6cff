//! MCP Server Entry Point
//!
//! Initializes logging, loads configuration and the OpenAPI document,
//! registers the tools and serves them on the configured transport. Any
//! startup failure is returned from `main`, so the process exits non-zero.

use anyhow::{Context, Result};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use mailjet_mcp_server::core::{Config, LoggingConfig, McpServer, TransportService};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging first so configuration warnings are visible
    init_logging(&LoggingConfig::from_env());

    let config = Config::from_env().context("invalid configuration")?;

    info!(
        "Starting {} v{} (profile '{}')",
        config.server.name, config.server.version, config.tools.profile
    );

    let transport = TransportService::new(config.transport.clone());
    let spec_path = config.openapi.spec_path.clone();

    let server = McpServer::from_config(config)
        .await
        .with_context(|| format!("failed to start from {}", spec_path.display()))?;

    info!("Server initialized with {} tools", server.registry().len());

    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr; stdout belongs to the STDIO transport.
fn init_logging(logging: &LoggingConfig) {
    let level = match logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if logging.with_timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }
}
