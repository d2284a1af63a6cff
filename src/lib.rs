//! Mailjet MCP Server Library
//!
//! This crate exposes the Mailjet REST API as Model Context Protocol tools.
//! Tools are not hand-written: they are generated at startup from the Mailjet
//! OpenAPI document, one per operation, each with a JSON Schema derived from
//! the operation's parameters and request body.
//!
//! # Architecture
//!
//! - **core**: Configuration, error handling, the MCP server and transports
//! - **domains**: Business logic organized by bounded contexts
//!   - **openapi**: Document loading, `$ref` resolution, schema translation,
//!     operation indexing and parameter planning
//!   - **tools**: Tool registration, validation, invocation and profiles
//!
//! # Example
//!
//! ```rust,no_run
//! use mailjet_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let transport = TransportService::new(config.transport.clone());
//!     let server = McpServer::from_config(config).await?;
//!     transport.run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
