//! Internal `$ref` resolution.
//!
//! Only document-local pointers (`#/components/schemas/Foo`) are supported;
//! the Mailjet document never references other files.

use serde_json::Value;

use super::error::SpecError;

/// Resolve a `#/...` pointer against the document root.
///
/// Segments are walked left to right through object keys (or array indices).
/// JSON-pointer escapes (`~1` for `/`, `~0` for `~`) are decoded.
pub fn resolve_reference<'a>(pointer: &str, root: &'a Value) -> Result<&'a Value, SpecError> {
    let Some(rest) = pointer.strip_prefix('#') else {
        return Err(SpecError::unresolved(format!(
            "{pointer} (only local '#/...' references are supported)"
        )));
    };

    if rest.is_empty() {
        return Ok(root);
    }

    let Some(rest) = rest.strip_prefix('/') else {
        return Err(SpecError::unresolved(pointer));
    };

    let mut node = root;
    for raw in rest.split('/') {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        node = match node {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
        .ok_or_else(|| SpecError::unresolved(pointer))?;
    }

    Ok(node)
}

/// Return the `$ref` pointer of a node, if it is a reference node.
pub fn reference_of(node: &Value) -> Option<&str> {
    node.get("$ref").and_then(Value::as_str)
}

/// Follow a chain of references until a concrete node is reached.
///
/// Chains longer than `MAX_HOPS` are treated as cyclic.
pub fn deref_node<'a>(node: &'a Value, root: &'a Value) -> Result<&'a Value, SpecError> {
    const MAX_HOPS: usize = 32;

    let mut current = node;
    for _ in 0..MAX_HOPS {
        match reference_of(current) {
            Some(pointer) => current = resolve_reference(pointer, root)?,
            None => return Ok(current),
        }
    }

    Err(SpecError::unresolved(format!(
        "{} (reference chain too deep)",
        reference_of(node).unwrap_or_default()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "components": {
                "schemas": {
                    "TestSchema": {
                        "type": "object",
                        "properties": { "a": { "type": "string" } }
                    },
                    "Alias": { "$ref": "#/components/schemas/TestSchema" },
                    "Loop": { "$ref": "#/components/schemas/Loop" },
                    "a/b": { "type": "boolean" }
                }
            },
            "servers": [{ "url": "https://api.mailjet.com" }]
        })
    }

    #[test]
    fn test_resolves_component_schema() {
        let doc = document();
        let resolved = resolve_reference("#/components/schemas/TestSchema", &doc).unwrap();
        assert_eq!(
            resolved,
            &json!({ "type": "object", "properties": { "a": { "type": "string" } } })
        );
    }

    #[test]
    fn test_resolves_array_index_and_escapes() {
        let doc = document();
        assert_eq!(
            resolve_reference("#/servers/0/url", &doc).unwrap(),
            &json!("https://api.mailjet.com")
        );
        assert_eq!(
            resolve_reference("#/components/schemas/a~1b", &doc).unwrap(),
            &json!({ "type": "boolean" })
        );
    }

    #[test]
    fn test_missing_segment_is_error() {
        let doc = document();
        let err = resolve_reference("#/components/schemas/Nope", &doc).unwrap_err();
        assert!(matches!(err, SpecError::UnresolvedReference(_)));
        assert!(err.to_string().contains("Nope"));
    }

    #[test]
    fn test_external_reference_is_error() {
        let doc = document();
        assert!(resolve_reference("common.yaml#/Foo", &doc).is_err());
    }

    #[test]
    fn test_deref_follows_chain() {
        let doc = document();
        let alias = json!({ "$ref": "#/components/schemas/Alias" });
        let resolved = deref_node(&alias, &doc).unwrap();
        assert_eq!(resolved["type"], json!("object"));
    }

    #[test]
    fn test_deref_detects_cycle() {
        let doc = document();
        let looped = json!({ "$ref": "#/components/schemas/Loop" });
        assert!(deref_node(&looped, &doc).is_err());
    }
}
