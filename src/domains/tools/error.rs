//! Tool-specific error types.

use rmcp::ErrorData as McpError;
use thiserror::Error;

/// Errors that can occur while registering or calling tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The arguments were rejected by the tool's validator set.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A templated path segment had no value.
    #[error("Required path parameter '{0}' is missing")]
    MissingPathParameter(String),

    /// No Mailjet API key is configured.
    #[error("Mailjet API key is not configured (set MAILJET_API_KEY)")]
    MissingCredential,

    /// The API answered with a non-2xx status or an unreadable body.
    #[error("Mailjet API error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// The request never got a response.
    #[error("Request to Mailjet failed: {0}")]
    Transport(String),

    /// The request exceeded the configured timeout.
    #[error("Request to Mailjet timed out after {0}s")]
    Timeout(u64),

    /// A tool with the same identifier is already registered.
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new "missing path parameter" error.
    pub fn missing_path_parameter(name: impl Into<String>) -> Self {
        Self::MissingPathParameter(name.into())
    }

    /// Create a new upstream error.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Create a new transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Protocol-level error for failures that happen before the tool runs.
    pub fn to_mcp_error(&self) -> McpError {
        match self {
            Self::NotFound(_) | Self::InvalidArguments(_) => {
                McpError::invalid_params(self.to_string(), None)
            }
            _ => McpError::internal_error(self.to_string(), None),
        }
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
