//! Invocation adapter: turns validated tool arguments into one HTTP call.
//!
//! Steps, in order: path substitution, query/body split, query string and
//! form body serialization, the request itself, and response interpretation.
//! Any failure before the request is sent means no network I/O happened.

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::domains::openapi::{HttpMethod, Operation, ParamLocation};

use super::client::{ApiRequest, ApiResponse, ApiTransport};
use super::error::ToolError;

/// Outcome of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub method: HttpMethod,
    /// Final request path, query string included.
    pub path: String,
    pub payload: Value,
}

/// Execute `operation` with already-validated `arguments`.
#[instrument(skip_all, fields(method = %operation.method, path = %operation.path))]
pub async fn invoke(
    operation: &Operation,
    arguments: Map<String, Value>,
    transport: &dyn ApiTransport,
) -> Result<Invocation, ToolError> {
    let (path, remaining) = process_path_parameters(&operation.path, operation, arguments)?;
    let (query, body) = separate_parameters(remaining, operation, operation.method);

    let path = append_query_string(&path, &query)?;
    let body = if operation.method == HttpMethod::Get {
        None
    } else {
        encode_form_body(&body)?
    };

    debug!("Calling {} {}", operation.method, path);
    let response = transport
        .send(ApiRequest {
            method: operation.method,
            path: path.clone(),
            body,
        })
        .await?;

    Ok(Invocation {
        method: operation.method,
        path,
        payload: interpret_response(response)?,
    })
}

/// Splice every declared path parameter into `template`.
///
/// Returns the concrete path and the arguments left over. Values are
/// percent-encoded as single path segments.
pub fn process_path_parameters(
    template: &str,
    operation: &Operation,
    mut arguments: Map<String, Value>,
) -> Result<(String, Map<String, Value>), ToolError> {
    let mut path = template.to_string();

    for parameter in operation.parameters_in(&ParamLocation::Path) {
        let value = match arguments.remove(&parameter.name) {
            Some(Value::Null) | None => {
                return Err(ToolError::missing_path_parameter(&parameter.name));
            }
            Some(value) => value,
        };

        let placeholder = format!("{{{}}}", parameter.name);
        path = path.replace(&placeholder, &encode_path_segment(&value_to_string(&value)));
    }

    Ok((path, arguments))
}

/// Split arguments into query and body parameters.
///
/// GET sends everything in the query string. Other verbs send declared
/// query parameters in the query string and everything else in the body.
pub fn separate_parameters(
    arguments: Map<String, Value>,
    operation: &Operation,
    method: HttpMethod,
) -> (Map<String, Value>, Map<String, Value>) {
    if method == HttpMethod::Get {
        return (arguments, Map::new());
    }

    let mut query = Map::new();
    let mut body = Map::new();
    for (name, value) in arguments {
        let in_query = operation
            .parameters_in(&ParamLocation::Query)
            .any(|p| p.name == name);
        if in_query {
            query.insert(name, value);
        } else {
            body.insert(name, value);
        }
    }

    (query, body)
}

/// Append `query` to `path`. Nulls are skipped; arrays are sent as one
/// comma-joined value.
pub fn append_query_string(path: &str, query: &Map<String, Value>) -> Result<String, ToolError> {
    let pairs: Vec<(&str, String)> = query
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| {
            let rendered = match value {
                Value::Array(items) => items
                    .iter()
                    .map(value_to_string)
                    .collect::<Vec<_>>()
                    .join(","),
                other => value_to_string(other),
            };
            (name.as_str(), rendered)
        })
        .collect();

    if pairs.is_empty() {
        return Ok(path.to_string());
    }

    let encoded = serde_urlencoded::to_string(&pairs)
        .map_err(|e| ToolError::internal(format!("query encoding failed: {e}")))?;
    let separator = if path.contains('?') { '&' } else { '?' };
    Ok(format!("{path}{separator}{encoded}"))
}

/// Form-encode body fields. Arrays repeat their key once per element;
/// nulls are skipped. Returns `None` when nothing is left to send.
pub fn encode_form_body(body: &Map<String, Value>) -> Result<Option<String>, ToolError> {
    let mut pairs: Vec<(&str, String)> = Vec::new();
    for (name, value) in body {
        match value {
            Value::Null => {}
            Value::Array(items) => pairs.extend(
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| (name.as_str(), value_to_string(item))),
            ),
            other => pairs.push((name.as_str(), value_to_string(other))),
        }
    }

    if pairs.is_empty() {
        return Ok(None);
    }

    serde_urlencoded::to_string(&pairs)
        .map(Some)
        .map_err(|e| ToolError::internal(format!("body encoding failed: {e}")))
}

/// Turn the raw response into a JSON payload or an upstream error.
pub fn interpret_response(response: ApiResponse) -> Result<Value, ToolError> {
    if !response.is_success() {
        return Err(ToolError::upstream(
            response.status,
            upstream_message(&response.body),
        ));
    }

    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&response.body).map_err(|e| {
        ToolError::upstream(
            response.status,
            format!("response is not valid JSON ({e}): {}", response.body),
        )
    })
}

/// Best human-readable message in an error body.
fn upstream_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = parsed.as_ref().and_then(|json| {
        ["ErrorMessage", "message", "error"]
            .into_iter()
            .find_map(|key| json.get(key).and_then(Value::as_str))
    });

    match field {
        Some(message) => message.to_string(),
        None if body.trim().is_empty() => "empty response body".to_string(),
        None => body.trim().to_string(),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_path_segment(s: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}

fn is_unreserved(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::openapi::OperationParameter;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn parameter(name: &str, location: ParamLocation, required: bool) -> OperationParameter {
        OperationParameter {
            name: name.to_string(),
            location,
            required,
            schema: json!({ "type": "string" }),
        }
    }

    fn operation(method: HttpMethod, path: &str, parameters: Vec<OperationParameter>) -> Operation {
        Operation {
            operation_id: "test".to_string(),
            method,
            path: path.to_string(),
            parameters,
            request_body: None,
            summary: None,
        }
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    /// Records requests and answers with a canned response.
    struct FakeTransport {
        response: ApiResponse,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl FakeTransport {
        fn answering(status: u16, body: &str) -> Self {
            Self {
                response: ApiResponse {
                    status,
                    body: body.to_string(),
                },
                seen: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<ApiRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ApiTransport for FakeTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ToolError> {
            self.seen.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    #[test]
    fn test_substitutes_path_parameters() {
        let op = operation(
            HttpMethod::Get,
            "/foo/{id}/bar",
            vec![
                parameter("id", ParamLocation::Path, true),
                parameter("q", ParamLocation::Query, false),
            ],
        );
        let (path, remaining) =
            process_path_parameters("/foo/{id}/bar", &op, args(json!({ "id": "123", "q": "abc" })))
                .unwrap();
        assert_eq!(path, "/foo/123/bar");
        assert_eq!(Value::Object(remaining), json!({ "q": "abc" }));
    }

    #[test]
    fn test_missing_path_parameter_names_it() {
        let op = operation(
            HttpMethod::Get,
            "/foo/{id}/bar",
            vec![parameter("id", ParamLocation::Path, true)],
        );
        let err = process_path_parameters("/foo/{id}/bar", &op, args(json!({ "q": "abc" })))
            .unwrap_err();
        assert_eq!(err.to_string(), "Required path parameter 'id' is missing");
    }

    #[test]
    fn test_path_values_are_percent_encoded() {
        let op = operation(
            HttpMethod::Get,
            "/v3/REST/contact/{contact_ID}",
            vec![parameter("contact_ID", ParamLocation::Path, true)],
        );
        let (path, _) = process_path_parameters(
            &op.path,
            &op,
            args(json!({ "contact_ID": "someone@example.com/x" })),
        )
        .unwrap();
        assert_eq!(path, "/v3/REST/contact/someone%40example.com%2Fx");

        let (path, _) =
            process_path_parameters(&op.path, &op, args(json!({ "contact_ID": 42 }))).unwrap();
        assert_eq!(path, "/v3/REST/contact/42");
    }

    #[test]
    fn test_separate_parameters_for_post() {
        let op = operation(
            HttpMethod::Post,
            "/x",
            vec![
                parameter("q", ParamLocation::Query, false),
                parameter("body", ParamLocation::Other("body".to_string()), false),
            ],
        );
        let (query, body) = separate_parameters(
            args(json!({ "q": "abc", "body": "val", "extra": 1 })),
            &op,
            HttpMethod::Post,
        );
        assert_eq!(Value::Object(query), json!({ "q": "abc" }));
        assert_eq!(Value::Object(body), json!({ "body": "val", "extra": 1 }));
    }

    #[test]
    fn test_separate_parameters_for_get() {
        let op = operation(
            HttpMethod::Get,
            "/x",
            vec![parameter("q", ParamLocation::Query, false)],
        );
        let (query, body) = separate_parameters(
            args(json!({ "q": "abc", "body": "val", "extra": 1 })),
            &op,
            HttpMethod::Get,
        );
        assert_eq!(Value::Object(query), json!({ "q": "abc", "body": "val", "extra": 1 }));
        assert!(body.is_empty());
    }

    #[test]
    fn test_append_query_string() {
        let path = append_query_string("/foo/bar", &args(json!({ "a": 1, "b": "test" }))).unwrap();
        assert!(path.starts_with("/foo/bar?"));
        assert!(path.contains("a=1"));
        assert!(path.contains("b=test"));

        assert_eq!(append_query_string("/foo", &Map::new()).unwrap(), "/foo");
    }

    #[test]
    fn test_query_skips_nulls_and_joins_arrays() {
        let path = append_query_string(
            "/v3/REST/contact",
            &args(json!({ "IDs": [1, 2, 3], "Skip": null, "Name": "a b" })),
        )
        .unwrap();
        assert_eq!(path, "/v3/REST/contact?IDs=1%2C2%2C3&Name=a+b");
    }

    #[test]
    fn test_form_body_repeats_arrays() {
        let body = encode_form_body(&args(json!({ "To": ["a@x.io", "b@x.io"], "Skip": null, "Sandbox": true })))
            .unwrap()
            .unwrap();
        assert_eq!(body, "To=a%40x.io&To=b%40x.io&Sandbox=true");
        assert_eq!(encode_form_body(&args(json!({ "Skip": null }))).unwrap(), None);
    }

    #[test]
    fn test_interpret_success_and_errors() {
        let ok = interpret_response(ApiResponse { status: 200, body: r#"{"Count":1}"#.into() }).unwrap();
        assert_eq!(ok, json!({ "Count": 1 }));

        let err = interpret_response(ApiResponse {
            status: 401,
            body: r#"{"ErrorMessage":"API key authentication/authorization failure"}"#.into(),
        })
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Mailjet API error (401): API key authentication/authorization failure"
        );

        let err = interpret_response(ApiResponse { status: 502, body: "Bad gateway".into() }).unwrap_err();
        assert!(err.to_string().contains("Bad gateway"));

        let err = interpret_response(ApiResponse { status: 200, body: "<html>".into() }).unwrap_err();
        assert!(matches!(err, ToolError::Upstream { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_invoke_post_splits_query_and_body() {
        let op = operation(
            HttpMethod::Post,
            "/v3/REST/contactslist/{list_ID}/managecontact",
            vec![
                parameter("list_ID", ParamLocation::Path, true),
                parameter("Mode", ParamLocation::Query, false),
            ],
        );
        let transport = FakeTransport::answering(201, r#"{"Data":[]}"#);

        let outcome = invoke(
            &op,
            args(json!({ "list_ID": 7, "Mode": "fast", "Email": "a@x.io" })),
            &transport,
        )
        .await
        .unwrap();

        assert_eq!(outcome.path, "/v3/REST/contactslist/7/managecontact?Mode=fast");
        assert_eq!(outcome.payload, json!({ "Data": [] }));

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].body.as_deref(), Some("Email=a%40x.io"));
    }

    #[tokio::test]
    async fn test_invoke_missing_path_parameter_sends_nothing() {
        let op = operation(
            HttpMethod::Get,
            "/v3/REST/contact/{contact_ID}",
            vec![parameter("contact_ID", ParamLocation::Path, true)],
        );
        let transport = FakeTransport::answering(200, "{}");

        let err = invoke(&op, Map::new(), &transport).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingPathParameter(ref name) if name == "contact_ID"));
        assert!(transport.requests().is_empty());
    }
}
