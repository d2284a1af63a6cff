//! Parameter planning: the combined validator set of one operation.

use serde_json::Value;
use tracing::{debug, warn};

use super::operations::{Operation, ParamLocation};
use super::reference::deref_node;
use super::schema::{ValidatorSet, required_names, translate};

/// Content type whose schema contributes body fields.
const JSON_CONTENT_TYPE: &str = "application/json";

/// Build the validator set for `operation`.
///
/// Path and query parameters come first, required exactly when the parameter
/// says so. Top-level properties of the JSON request body follow and
/// overwrite any parameter of the same name.
pub fn build_params_schema(operation: &Operation, root: &Value) -> ValidatorSet {
    let mut set = ValidatorSet::new();

    for parameter in &operation.parameters {
        if !matches!(parameter.location, ParamLocation::Path | ParamLocation::Query) {
            debug!(
                "Ignoring {} parameter '{}' on {} {}",
                location_name(&parameter.location),
                parameter.name,
                operation.method,
                operation.path
            );
            continue;
        }

        let validator = translate(&parameter.schema, root).with_required(parameter.required);
        set.insert(parameter.name.clone(), validator);
    }

    if let Some(body) = body_schema(operation, root) {
        let required = required_names(body);
        let properties = body.get("properties").and_then(Value::as_object);

        for (name, schema) in properties.into_iter().flatten() {
            let validator = translate(schema, root).with_required(required.contains(&name.as_str()));
            if set.insert(name.clone(), validator).is_some() {
                debug!(
                    "Body property '{}' replaces parameter of the same name on {} {}",
                    name, operation.method, operation.path
                );
            }
        }
    }

    set
}

/// The resolved `application/json` body schema, when the operation has one.
fn body_schema<'a>(operation: &'a Operation, root: &'a Value) -> Option<&'a Value> {
    let request_body = deref_node(operation.request_body.as_ref()?, root)
        .inspect_err(|e| warn!("Ignoring request body of {}: {}", operation.path, e))
        .ok()?;

    let schema = request_body
        .get("content")?
        .get(JSON_CONTENT_TYPE)?
        .get("schema")?;

    deref_node(schema, root)
        .inspect_err(|e| warn!("Ignoring body schema of {}: {}", operation.path, e))
        .ok()
}

fn location_name(location: &ParamLocation) -> &str {
    match location {
        ParamLocation::Path => "path",
        ParamLocation::Query => "query",
        ParamLocation::Other(other) => other,
    }
}
