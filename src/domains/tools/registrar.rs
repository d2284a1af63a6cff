//! Tool registrar: one tool per indexed operation.

use tracing::{debug, error, info, warn};

use crate::domains::openapi::{
    ApiDocument, HttpMethod, Operation, ValidatorSet, build_params_schema, extract_endpoints,
    operation_details, sanitize_tool_id,
};

use super::error::ToolError;
use super::profiles::allows;

/// Everything a host needs to expose and later invoke one operation.
#[derive(Debug, Clone)]
pub struct RegisteredTool {
    pub id: String,
    pub description: String,
    pub validators: ValidatorSet,
    pub operation: Operation,
}

impl RegisteredTool {
    pub fn method(&self) -> HttpMethod {
        self.operation.method
    }

    pub fn path(&self) -> &str {
        &self.operation.path
    }
}

/// Receives tools from the registrar.
pub trait ToolHost {
    fn register_tool(&mut self, tool: RegisteredTool) -> Result<(), ToolError>;
}

/// Counts from one registration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    pub registered: usize,
    /// Operations excluded by the prefix allowlist.
    pub filtered: usize,
    /// Operations that could not be resolved or were refused by the host.
    pub failed: usize,
}

/// Register every GET operation of `document` whose tool identifier matches
/// one of `prefixes` (all of them when `prefixes` is empty).
///
/// Only GET operations are exposed; write verbs are indexed but not
/// registered. Per-operation failures are logged and skipped.
pub fn register_operations<S: AsRef<str>>(
    document: &ApiDocument,
    prefixes: &[S],
    host: &mut dyn ToolHost,
) -> RegistrationReport {
    let root = document.root();
    let endpoints = extract_endpoints(root);
    let method = HttpMethod::Get;
    let mut report = RegistrationReport::default();

    for path in endpoints.paths(method) {
        let Some(operation) = operation_details(root, method, path) else {
            warn!("Could not match endpoint: {} {} in OpenAPI document", method, path);
            report.failed += 1;
            continue;
        };

        let id = sanitize_tool_id(&operation.operation_id);
        if !allows(prefixes, &id) {
            debug!("Tool '{}' excluded by prefix filter", id);
            report.filtered += 1;
            continue;
        }

        let tool = RegisteredTool {
            description: operation.description(),
            validators: build_params_schema(&operation, root),
            id,
            operation,
        };

        match host.register_tool(tool) {
            Ok(()) => report.registered += 1,
            Err(e) => {
                error!("Failed to process endpoint {} {}: {}", method, path, e);
                report.failed += 1;
            }
        }
    }

    info!(
        "Registered {} tools ({} filtered, {} failed)",
        report.registered, report.filtered, report.failed
    );
    report
}
