//! Domains module containing business logic organized by bounded contexts.
//!
//! - `openapi`: reading and interpreting the Mailjet OpenAPI document
//! - `tools`: turning operations into callable MCP tools

pub mod openapi;
pub mod tools;
