//! Tools domain module.
//!
//! Tools are generated at startup from the Mailjet OpenAPI document: one tool
//! per GET operation, filtered by the active profile's identifier prefixes.
//!
//! ## Architecture
//!
//! - `registrar.rs` - Walks the document and hands tools to a [`ToolHost`]
//! - `registry.rs` - Central tool registry, validation and dispatch
//! - `router.rs` - Dynamic ToolRouter builder for STDIO/TCP transport
//! - `invocation.rs` - Path/query/body planning and the HTTP call
//! - `client.rs` - Authenticated Mailjet client behind [`ApiTransport`]
//! - `results.rs` - Normalization of call outcomes into tool results
//! - `profiles.rs` - Built-in deployment profiles
//! - `error.rs` - Tool-specific error types

pub mod client;
mod error;
pub mod invocation;
pub mod profiles;
pub mod registrar;
mod registry;
pub mod results;
pub mod router;

pub use client::{ApiRequest, ApiResponse, ApiTransport, MailjetClient};
pub use error::ToolError;
pub use profiles::ToolProfile;
pub use registrar::{RegisteredTool, RegistrationReport, ToolHost, register_operations};
pub use registry::ToolRegistry;
pub use router::build_tool_router;
