//! Result normalization: every call ends as a text `CallToolResult`.

use rmcp::model::{CallToolResult, Content};
use tracing::warn;

use super::error::ToolError;
use super::invocation::Invocation;

/// Convert an invocation outcome into a tool result. Never fails.
pub fn normalize(outcome: Result<Invocation, ToolError>) -> CallToolResult {
    match outcome {
        Ok(invocation) => success_result(&invocation),
        Err(err) => error_result(&err),
    }
}

/// Success text: the request line followed by the pretty-printed payload.
pub fn success_result(invocation: &Invocation) -> CallToolResult {
    let payload = serde_json::to_string_pretty(&invocation.payload)
        .unwrap_or_else(|_| invocation.payload.to_string());

    CallToolResult::success(vec![Content::text(format!(
        "{} {} succeeded:\n{}",
        invocation.method, invocation.path, payload
    ))])
}

/// Error result carrying the error text.
pub fn error_result(err: &ToolError) -> CallToolResult {
    warn!("Tool call failed: {}", err);
    CallToolResult::error(vec![Content::text(format!("Error: {err}"))])
}
