//! Specification document loading and shape validation.
//!
//! The document is kept as a `serde_json::Value` tree (key order preserved)
//! so that schema translation can walk arbitrary `$ref` pointers. Shape
//! validation happens once, at load time, by deserializing the tree into the
//! `*Shape` structs below.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument};

use super::error::SpecError;

/// A loaded and validated OpenAPI document.
#[derive(Debug, Clone)]
pub struct ApiDocument {
    root: Value,
    title: String,
    version: String,
}

impl ApiDocument {
    /// Read, parse and validate the document at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SpecError> {
        let path = path.as_ref();
        let origin = path.display().to_string();

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SpecError::Load {
                path: origin.clone(),
                source,
            })?;

        let document = Self::from_yaml_str(&contents, &origin)?;
        info!(
            "Loaded OpenAPI document '{}' v{} ({} paths)",
            document.title,
            document.version,
            document.paths().map_or(0, Map::len)
        );
        Ok(document)
    }

    /// Parse and validate a YAML (or JSON) document. `origin` names it in errors.
    pub fn from_yaml_str(source: &str, origin: &str) -> Result<Self, SpecError> {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(source).map_err(|source| SpecError::Parse {
                path: origin.to_string(),
                source,
            })?;

        // Goes through the YAML value so that non-string mapping keys
        // (e.g. `200:` under `responses`) become JSON object keys.
        let root = serde_json::to_value(yaml).map_err(|e| {
            SpecError::validation(format!("document is not representable as JSON: {e}"))
        })?;

        Self::from_value(root)
    }

    /// Validate an already-parsed document tree.
    pub fn from_value(root: Value) -> Result<Self, SpecError> {
        let shape = DocumentShape::deserialize(&root).map_err(|e| SpecError::validation(e.to_string()))?;

        Ok(Self {
            title: shape.info.title,
            version: shape.info.version,
            root,
        })
    }

    /// The raw document tree, used as the root for `$ref` resolution.
    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The `paths` mapping, in document order.
    pub fn paths(&self) -> Option<&Map<String, Value>> {
        self.root.get("paths").and_then(Value::as_object)
    }
}

// ============================================================================
// Expected document shape
// ============================================================================

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct DocumentShape {
    openapi: String,
    info: InfoShape,
    servers: Vec<ServerShape>,
    paths: BTreeMap<String, PathItemShape>,
    tags: Vec<TagShape>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct InfoShape {
    title: String,
    description: String,
    version: String,
    #[serde(default)]
    contact: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct ServerShape {
    url: String,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct TagShape {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct PathItemShape {
    #[serde(default)]
    get: Option<OperationShape>,
    #[serde(default)]
    post: Option<OperationShape>,
    #[serde(default)]
    put: Option<OperationShape>,
    #[serde(default)]
    delete: Option<OperationShape>,
    #[serde(default)]
    parameters: Option<Vec<ParameterShape>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct OperationShape {
    description: String,
    #[serde(default)]
    parameters: Option<Vec<ParameterShape>>,
    #[serde(default)]
    operation_id: Option<String>,
    #[serde(default)]
    request_body: Option<RequestBodyShape>,
    responses: Map<String, Value>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
#[allow(dead_code)]
enum ParameterShape {
    Inline {
        name: String,
        #[serde(rename = "in")]
        location: String,
        #[serde(default)]
        required: Option<bool>,
        schema: ParameterSchemaShape,
    },
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
#[allow(dead_code)]
enum ParameterSchemaShape {
    Typed {
        #[serde(rename = "type")]
        ty: String,
    },
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
#[allow(dead_code)]
enum RequestBodyShape {
    Inline {
        content: BTreeMap<String, MediaTypeShape>,
    },
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct MediaTypeShape {
    #[serde(default)]
    schema: Option<Map<String, Value>>,
    #[serde(default)]
    examples: Option<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
openapi: 3.0.0
info:
  title: Mailjet API
  description: Email API
  version: "3.0"
servers:
  - url: https://api.mailjet.com
tags:
  - name: message
paths:
  /v3/REST/message:
    get:
      operationId: get_v3_message
      description: List messages
      summary: Get messages
      responses:
        200:
          description: OK
"#;

    #[test]
    fn test_parses_minimal_document() {
        let doc = ApiDocument::from_yaml_str(MINIMAL, "inline").unwrap();
        assert_eq!(doc.title(), "Mailjet API");
        assert_eq!(doc.version(), "3.0");
        assert_eq!(doc.paths().unwrap().len(), 1);
        assert_eq!(
            doc.root()["paths"]["/v3/REST/message"]["get"]["responses"]["200"]["description"],
            json!("OK")
        );
    }

    #[test]
    fn test_rejects_malformed_yaml() {
        let err = ApiDocument::from_yaml_str("paths: [unterminated", "broken.yaml").unwrap_err();
        assert!(matches!(err, SpecError::Parse { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_rejects_missing_required_sections() {
        let err = ApiDocument::from_value(json!({ "openapi": "3.0.0", "paths": {} })).unwrap_err();
        assert!(matches!(err, SpecError::Validation(_)));
    }

    #[test]
    fn test_rejects_operation_without_description() {
        let err = ApiDocument::from_value(json!({
            "openapi": "3.0.0",
            "info": { "title": "t", "description": "d", "version": "1" },
            "servers": [{ "url": "https://api.mailjet.com" }],
            "tags": [],
            "paths": { "/v3/REST/contact": { "get": { "responses": {} } } }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("validation"));
    }

    #[test]
    fn test_accepts_parameter_references() {
        let doc = ApiDocument::from_value(json!({
            "openapi": "3.0.0",
            "info": { "title": "t", "description": "d", "version": "1" },
            "servers": [{ "url": "https://api.mailjet.com" }],
            "tags": [],
            "paths": {
                "/v3/REST/contact/{contact_ID}": {
                    "parameters": [{ "$ref": "#/components/parameters/ContactId" }],
                    "get": { "description": "Get contact", "responses": {} }
                }
            }
        }));
        assert!(doc.is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let doc = tokio_test::block_on(ApiDocument::load(file.path())).unwrap();
        assert_eq!(doc.title(), "Mailjet API");
    }

    #[test]
    fn test_load_bundled_document() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/mailjet-openapi.yaml");
        let doc = tokio_test::block_on(ApiDocument::load(path)).unwrap();
        assert_eq!(doc.title(), "Mailjet API");
        assert!(doc.paths().unwrap().contains_key("/v3.1/send"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = tokio_test::block_on(ApiDocument::load("/nonexistent/mailjet-openapi.yaml"))
            .unwrap_err();
        assert!(matches!(err, SpecError::Load { .. }));
    }
}
