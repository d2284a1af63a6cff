//! OpenAPI document domain.
//!
//! Everything needed to turn the Mailjet OpenAPI document into tool
//! definitions: loading, `$ref` resolution, schema translation, operation
//! indexing and parameter planning. Nothing here performs network I/O.

pub mod document;
pub mod error;
pub mod operations;
pub mod params;
pub mod reference;
pub mod schema;

pub use document::ApiDocument;
pub use error::{SpecError, ValidationErrors};
pub use operations::{
    EndpointIndex, HttpMethod, Operation, OperationParameter, ParamLocation, extract_endpoints,
    operation_details, sanitize_tool_id,
};
pub use params::build_params_schema;
pub use reference::resolve_reference;
pub use schema::{Validator, ValidatorKind, ValidatorSet, translate};
