//! Operation indexing: which verbs exist on which paths, and the full
//! operation descriptor for one verb+path pair.

use serde_json::Value;
use std::fmt;
use tracing::warn;

use super::reference::deref_node;

/// HTTP verbs the server knows how to expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 4] = [Self::Get, Self::Post, Self::Put, Self::Delete];

    /// Upper-case verb, as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Lower-case key used for the operation under a path item.
    pub fn key(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
        }
    }

    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paths declared in the document, grouped by verb, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointIndex {
    pub get: Vec<String>,
    pub post: Vec<String>,
    pub put: Vec<String>,
    pub delete: Vec<String>,
}

impl EndpointIndex {
    pub fn paths(&self, method: HttpMethod) -> &[String] {
        match method {
            HttpMethod::Get => &self.get,
            HttpMethod::Post => &self.post,
            HttpMethod::Put => &self.put,
            HttpMethod::Delete => &self.delete,
        }
    }

    fn push(&mut self, method: HttpMethod, path: &str) {
        let list = match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
        };
        list.push(path.to_string());
    }
}

/// List every path under each verb it declares.
pub fn extract_endpoints(doc: &Value) -> EndpointIndex {
    let mut index = EndpointIndex::default();

    let Some(paths) = doc.get("paths").and_then(Value::as_object) else {
        return index;
    };

    for (path, item) in paths {
        for method in HttpMethod::ALL {
            if item.get(method.key()).is_some() {
                index.push(method, path);
            }
        }
    }

    index
}

// ============================================================================
// Operation descriptor
// ============================================================================

/// Where a declared parameter lives on the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    /// Any other `in` value (`header`, `cookie`, legacy `body`).
    Other(String),
}

impl ParamLocation {
    fn parse(value: &str) -> Self {
        match value {
            "path" => Self::Path,
            "query" => Self::Query,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One declared operation parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationParameter {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    /// Schema node, possibly still a `$ref`.
    pub schema: Value,
}

/// Everything needed to plan and invoke one verb+path pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operation_id: String,
    pub method: HttpMethod,
    /// Templated path with `{name}` placeholders.
    pub path: String,
    pub parameters: Vec<OperationParameter>,
    /// The raw `requestBody` object, when declared.
    pub request_body: Option<Value>,
    pub summary: Option<String>,
}

impl Operation {
    pub fn parameters_in(&self, location: &ParamLocation) -> impl Iterator<Item = &OperationParameter> {
        self.parameters.iter().filter(move |p| &p.location == location)
    }

    /// Tool description: the summary, or `"<METHOD> <path>"` when absent.
    pub fn description(&self) -> String {
        self.summary
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format!("{} {}", self.method, self.path))
    }
}

/// Look up the operation for `method` on `path`.
///
/// Returns `None` when the document has no such operation, or declares it
/// empty (`get:` with no body). The identifier is
/// the GET operation's `operationId` when the path declares one (whatever
/// `method` is), otherwise a synthesized `"<method>-<path>"`.
pub fn operation_details(doc: &Value, method: HttpMethod, path: &str) -> Option<Operation> {
    let item = doc.get("paths")?.get(path)?;
    let op = item.get(method.key()).filter(|op| op.is_object())?;

    let operation_id = item
        .get("get")
        .and_then(|get| get.get("operationId"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| synthesize_operation_id(method, path));

    Some(Operation {
        operation_id,
        method,
        path: path.to_string(),
        parameters: merged_parameters(item, op, doc),
        request_body: op.get("requestBody").cloned(),
        summary: op.get("summary").and_then(Value::as_str).map(str::to_owned),
    })
}

/// Path-item parameters first, then operation parameters overriding any with
/// the same `(name, in)`.
fn merged_parameters(item: &Value, op: &Value, doc: &Value) -> Vec<OperationParameter> {
    let mut merged: Vec<OperationParameter> = Vec::new();

    let declared = [item, op]
        .into_iter()
        .filter_map(|node| node.get("parameters").and_then(Value::as_array))
        .flatten();

    for raw in declared {
        let node = match deref_node(raw, doc) {
            Ok(node) => node,
            Err(e) => {
                warn!("Skipping parameter: {}", e);
                continue;
            }
        };
        let Some(name) = node.get("name").and_then(Value::as_str) else {
            warn!("Skipping parameter without a name");
            continue;
        };

        let parameter = OperationParameter {
            name: name.to_string(),
            location: ParamLocation::parse(node.get("in").and_then(Value::as_str).unwrap_or("query")),
            required: node.get("required").and_then(Value::as_bool).unwrap_or(false),
            schema: node.get("schema").cloned().unwrap_or(Value::Null),
        };

        match merged
            .iter_mut()
            .find(|p| p.name == parameter.name && p.location == parameter.location)
        {
            Some(existing) => *existing = parameter,
            None => merged.push(parameter),
        }
    }

    merged
}

/// `"<method>-<path>"` with every run of separator characters collapsed to
/// a single `-`.
pub fn synthesize_operation_id(method: HttpMethod, path: &str) -> String {
    let mut id = String::from(method.key());
    let mut pending_separator = true;

    for c in path.chars() {
        if is_word_char(c) {
            if pending_separator {
                id.push('-');
                pending_separator = false;
            }
            id.push(c);
        } else {
            pending_separator = true;
        }
    }

    id
}

/// Tool identifier for an operation id: lower-cased, with every non-word
/// character replaced by `-`.
pub fn sanitize_tool_id(operation_id: &str) -> String {
    operation_id
        .to_lowercase()
        .chars()
        .map(|c| if is_word_char(c) { c } else { '-' })
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
