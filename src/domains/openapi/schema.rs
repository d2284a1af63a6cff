//! Schema translation: OpenAPI schema nodes to runtime validators.
//!
//! A [`Validator`] is a small, checkable description of the shape a value must
//! have. The translator understands what the Mailjet document uses
//! (references, primitives, arrays, objects, `oneOf`/`anyOf` unions and
//! string enums) and accepts anything else.
//!
//! Translation order for a node is fixed:
//!
//! 1. `$ref` (resolved, then translated)
//! 2. `enum` on a string or untyped node
//! 3. `string`, `number`/`integer`, `boolean`
//! 4. `array`
//! 5. `object`, or untyped with `properties`
//! 6. `oneOf` / `anyOf`
//! 7. accept-anything

use regex::Regex;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::error::ValidationErrors;
use super::reference::{reference_of, resolve_reference};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// The shape a [`Validator`] checks.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatorKind {
    /// Any string; `email` additionally requires an address-shaped value.
    String { email: bool },

    /// Exactly one of the listed literals.
    Enum(Vec<Value>),

    /// Any JSON number, with inclusive bounds.
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },

    Boolean,

    /// An array whose every element satisfies the item validator.
    Array(Box<Validator>),

    /// An object with known properties, kept in document order.
    Object(Vec<(String, Validator)>),

    /// An open string-keyed map of anything.
    Map,

    /// At least one alternative must accept the value.
    Union(Vec<Validator>),

    /// Accepts every value. `note` explains why, when the fallback was forced.
    Any { note: Option<String> },
}

/// A runtime-checkable description of one value.
#[derive(Debug, Clone, PartialEq)]
pub struct Validator {
    pub kind: ValidatorKind,
    /// Whether the owning object (or validator set) rejects its absence.
    pub required: bool,
    /// Help text carried over from the schema node.
    pub description: Option<String>,
}

impl Validator {
    /// Create a required validator of the given kind.
    pub fn new(kind: ValidatorKind) -> Self {
        Self {
            kind,
            required: true,
            description: None,
        }
    }

    /// Accept-anything validator.
    pub fn any() -> Self {
        Self::new(ValidatorKind::Any { note: None })
    }

    /// Accept-anything validator carrying a diagnostic note.
    pub fn any_with_note(note: impl Into<String>) -> Self {
        Self::new(ValidatorKind::Any {
            note: Some(note.into()),
        })
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Short name of the validator kind, used in logs and help text.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ValidatorKind::String { .. } => "string",
            ValidatorKind::Enum(_) => "enum",
            ValidatorKind::Number { .. } => "number",
            ValidatorKind::Boolean => "boolean",
            ValidatorKind::Array(_) => "array",
            ValidatorKind::Object(_) => "object",
            ValidatorKind::Map => "map",
            ValidatorKind::Union(_) => "union",
            ValidatorKind::Any { .. } => "any",
        }
    }

    /// Check `value`, appending one message per violation to `errors`.
    ///
    /// `at` names the value in messages (e.g. `Filters.Limit`).
    pub fn check(&self, value: &Value, at: &str, errors: &mut Vec<String>) {
        match &self.kind {
            ValidatorKind::String { email } => match value.as_str() {
                Some(s) if *email && !EMAIL_PATTERN.is_match(s) => {
                    errors.push(format!("'{at}' must be a valid email address"));
                }
                Some(_) => {}
                None => errors.push(format!("'{at}' must be a string")),
            },
            ValidatorKind::Enum(allowed) => {
                if !allowed.contains(value) {
                    let options: Vec<String> = allowed.iter().map(Value::to_string).collect();
                    errors.push(format!("'{at}' must be one of [{}]", options.join(", ")));
                }
            }
            ValidatorKind::Number { minimum, maximum } => match value.as_f64() {
                Some(n) => {
                    if let Some(min) = minimum.filter(|min| n < *min) {
                        errors.push(format!("'{at}' must be greater than or equal to {min}"));
                    }
                    if let Some(max) = maximum.filter(|max| n > *max) {
                        errors.push(format!("'{at}' must be less than or equal to {max}"));
                    }
                }
                None => errors.push(format!("'{at}' must be a number")),
            },
            ValidatorKind::Boolean => {
                if !value.is_boolean() {
                    errors.push(format!("'{at}' must be a boolean"));
                }
            }
            ValidatorKind::Array(items) => match value.as_array() {
                Some(elements) => {
                    for (i, element) in elements.iter().enumerate() {
                        items.check(element, &format!("{at}[{i}]"), errors);
                    }
                }
                None => errors.push(format!("'{at}' must be an array")),
            },
            ValidatorKind::Object(properties) => match value.as_object() {
                Some(object) => {
                    for (key, property) in properties {
                        let child = format!("{at}.{key}");
                        match object.get(key) {
                            None | Some(Value::Null) if property.required => {
                                errors.push(format!("'{child}' is required"));
                            }
                            None | Some(Value::Null) => {}
                            Some(v) => property.check(v, &child, errors),
                        }
                    }
                }
                None => errors.push(format!("'{at}' must be an object")),
            },
            ValidatorKind::Map => {
                if !value.is_object() {
                    errors.push(format!("'{at}' must be an object"));
                }
            }
            ValidatorKind::Union(alternatives) => {
                let matched = alternatives.iter().any(|alt| {
                    let mut scratch = Vec::new();
                    alt.check(value, at, &mut scratch);
                    scratch.is_empty()
                });
                if !matched {
                    errors.push(format!("'{at}' does not match any allowed shape"));
                }
            }
            ValidatorKind::Any { .. } => {}
        }
    }

    /// Render this validator as a JSON Schema fragment for tool listings.
    pub fn to_json_schema(&self) -> Value {
        let mut schema = match &self.kind {
            ValidatorKind::String { email } => {
                let mut s = json!({ "type": "string" });
                if *email {
                    s["format"] = json!("email");
                }
                s
            }
            ValidatorKind::Enum(values) => {
                let mut s = json!({ "enum": values });
                if values.iter().all(Value::is_string) {
                    s["type"] = json!("string");
                }
                s
            }
            ValidatorKind::Number { minimum, maximum } => {
                let mut s = json!({ "type": "number" });
                if let Some(min) = minimum {
                    s["minimum"] = json!(min);
                }
                if let Some(max) = maximum {
                    s["maximum"] = json!(max);
                }
                s
            }
            ValidatorKind::Boolean => json!({ "type": "boolean" }),
            ValidatorKind::Array(items) => json!({
                "type": "array",
                "items": items.to_json_schema(),
            }),
            ValidatorKind::Object(properties) => {
                let mut props = Map::new();
                let mut required = Vec::new();
                for (key, property) in properties {
                    props.insert(key.clone(), property.to_json_schema());
                    if property.required {
                        required.push(json!(key));
                    }
                }
                let mut s = json!({ "type": "object", "properties": props });
                if !required.is_empty() {
                    s["required"] = Value::Array(required);
                }
                s
            }
            ValidatorKind::Map => json!({ "type": "object", "additionalProperties": true }),
            ValidatorKind::Union(alternatives) => json!({
                "anyOf": alternatives.iter().map(Validator::to_json_schema).collect::<Vec<_>>(),
            }),
            ValidatorKind::Any { .. } => json!({}),
        };

        let note = match &self.kind {
            ValidatorKind::Any { note } => note.as_deref(),
            _ => None,
        };
        let description = match (self.description.as_deref(), note) {
            (Some(d), Some(n)) => Some(format!("{d} ({n})")),
            (Some(d), None) => Some(d.to_string()),
            (None, Some(n)) => Some(format!("({n})")),
            (None, None) => None,
        };
        if let Some(description) = description {
            schema["description"] = json!(description);
        }

        schema
    }
}

/// Translate a schema node into a validator.
///
/// Pure in `node` and `root`. Broken references never fail the translation:
/// they become accept-anything validators carrying the resolution error.
pub fn translate(node: &Value, root: &Value) -> Validator {
    Translator {
        root,
        active: Vec::new(),
    }
    .translate(node)
}

struct Translator<'a> {
    root: &'a Value,
    /// References currently being expanded, to stop on cycles.
    active: Vec<String>,
}

impl Translator<'_> {
    fn translate(&mut self, node: &Value) -> Validator {
        if let Some(pointer) = reference_of(node) {
            return self.translate_reference(pointer);
        }

        let description = node
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_owned);

        Validator::new(self.kind_of(node)).with_description(description)
    }

    fn translate_reference(&mut self, pointer: &str) -> Validator {
        if self.active.iter().any(|p| p == pointer) {
            debug!("Circular reference {} translated as any", pointer);
            return Validator::any_with_note(format!("circular reference to {pointer}"));
        }

        let root = self.root;
        match resolve_reference(pointer, root) {
            Ok(target) => {
                self.active.push(pointer.to_owned());
                let validator = self.translate(target);
                self.active.pop();
                validator
            }
            Err(e) => {
                warn!("{}; accepting any value instead", e);
                Validator::any_with_note(e.to_string())
            }
        }
    }

    fn kind_of(&mut self, node: &Value) -> ValidatorKind {
        let declared = declared_type(node);

        let literals = node
            .get("enum")
            .and_then(Value::as_array)
            .filter(|values| !values.is_empty());
        if let Some(values) = literals {
            if matches!(declared, None | Some("string")) {
                return ValidatorKind::Enum(values.clone());
            }
        }

        match declared {
            Some("string") => ValidatorKind::String {
                email: node.get("format").and_then(Value::as_str) == Some("email"),
            },
            Some("number") | Some("integer") => ValidatorKind::Number {
                minimum: node.get("minimum").and_then(Value::as_f64),
                maximum: node.get("maximum").and_then(Value::as_f64),
            },
            Some("boolean") => ValidatorKind::Boolean,
            Some("array") => {
                let items = node
                    .get("items")
                    .map(|items| self.translate(items))
                    .unwrap_or_else(Validator::any);
                ValidatorKind::Array(Box::new(items))
            }
            Some("object") => match node.get("properties").and_then(Value::as_object) {
                Some(properties) => self.object(properties, node),
                None => ValidatorKind::Map,
            },
            _ => {
                if let Some(properties) = node.get("properties").and_then(Value::as_object) {
                    return self.object(properties, node);
                }
                let alternatives = node
                    .get("oneOf")
                    .or_else(|| node.get("anyOf"))
                    .and_then(Value::as_array);
                match alternatives {
                    Some(alts) => {
                        ValidatorKind::Union(alts.iter().map(|alt| self.translate(alt)).collect())
                    }
                    None => ValidatorKind::Any { note: None },
                }
            }
        }
    }

    fn object(&mut self, properties: &Map<String, Value>, node: &Value) -> ValidatorKind {
        let required = required_names(node);
        let fields = properties
            .iter()
            .map(|(key, schema)| {
                let validator = self
                    .translate(schema)
                    .with_required(required.iter().any(|r| r == key));
                (key.clone(), validator)
            })
            .collect();
        ValidatorKind::Object(fields)
    }
}

/// The node's `type`, picking the first non-null entry of a type list.
fn declared_type(node: &Value) -> Option<&str> {
    match node.get("type") {
        Some(Value::String(ty)) => Some(ty.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|ty| *ty != "null"),
        _ => None,
    }
}

/// Names listed in a schema node's `required` array.
pub fn required_names(node: &Value) -> Vec<&str> {
    node.get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

// ============================================================================
// Validator Set
// ============================================================================

/// The full input contract of one operation: parameter name to validator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatorSet {
    entries: BTreeMap<String, Validator>,
}

impl ValidatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entry, returning the previous validator.
    pub fn insert(&mut self, name: impl Into<String>, validator: Validator) -> Option<Validator> {
        self.entries.insert(name.into(), validator)
    }

    pub fn get(&self, name: &str) -> Option<&Validator> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Validator)> {
        self.entries.iter()
    }

    /// Names of the entries a call must supply.
    pub fn required_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, v)| v.required)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Validate call arguments.
    ///
    /// On success returns the arguments restricted to declared names, with
    /// `null` values dropped. Undeclared names are stripped, not rejected.
    pub fn validate(&self, arguments: &Map<String, Value>) -> Result<Map<String, Value>, ValidationErrors> {
        let mut errors = Vec::new();
        let mut accepted = Map::new();

        for (name, validator) in &self.entries {
            match arguments.get(name) {
                None | Some(Value::Null) => {
                    if validator.required {
                        errors.push(format!("Missing required parameter '{name}'"));
                    }
                }
                Some(value) => {
                    validator.check(value, name, &mut errors);
                    accepted.insert(name.clone(), value.clone());
                }
            }
        }

        if errors.is_empty() {
            Ok(accepted)
        } else {
            Err(ValidationErrors(errors))
        }
    }

    /// JSON Schema of the whole input object, as advertised to MCP clients.
    pub fn to_input_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        for (name, validator) in &self.entries {
            properties.insert(name.clone(), validator.to_json_schema());
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        let required = self.required_names();
        if !required.is_empty() {
            schema.insert("required".to_string(), json!(required));
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> Value {
        json!({
            "components": {
                "schemas": {
                    "TestSchema": {
                        "type": "object",
                        "properties": { "a": { "type": "string" } }
                    },
                    "Node": {
                        "type": "object",
                        "properties": {
                            "Name": { "type": "string" },
                            "Child": { "$ref": "#/components/schemas/Node" }
                        }
                    }
                }
            }
        })
    }

    fn translated(node: Value) -> Validator {
        translate(&node, &document())
    }

    fn errors_for(validator: &Validator, value: Value) -> Vec<String> {
        let mut errors = Vec::new();
        validator.check(&value, "value", &mut errors);
        errors
    }

    #[test]
    fn test_string_schema() {
        let v = translated(json!({ "type": "string", "description": "Contact name" }));
        assert_eq!(v.kind, ValidatorKind::String { email: false });
        assert_eq!(v.description.as_deref(), Some("Contact name"));
        assert!(errors_for(&v, json!("x")).is_empty());
        assert_eq!(errors_for(&v, json!(1)).len(), 1);
    }

    #[test]
    fn test_email_format() {
        let v = translated(json!({ "type": "string", "format": "email" }));
        assert!(errors_for(&v, json!("someone@example.com")).is_empty());
        assert_eq!(errors_for(&v, json!("not-an-email")).len(), 1);
    }

    #[test]
    fn test_enum_takes_precedence_over_string() {
        let v = translated(json!({ "type": "string", "enum": ["a", "b"] }));
        assert_eq!(v.kind, ValidatorKind::Enum(vec![json!("a"), json!("b")]));
        assert!(errors_for(&v, json!("a")).is_empty());
        assert_eq!(errors_for(&v, json!("c")).len(), 1);
    }

    #[test]
    fn test_enum_on_integer_stays_numeric() {
        let v = translated(json!({ "type": "integer", "enum": [1, 2] }));
        assert_eq!(v.kind_name(), "number");
    }

    #[test]
    fn test_number_bounds_are_inclusive() {
        let v = translated(json!({ "type": "integer", "minimum": 1, "maximum": 1000 }));
        assert!(errors_for(&v, json!(1)).is_empty());
        assert!(errors_for(&v, json!(1000)).is_empty());
        assert_eq!(errors_for(&v, json!(0)).len(), 1);
        assert_eq!(errors_for(&v, json!(1001)).len(), 1);
        assert_eq!(errors_for(&v, json!("10")).len(), 1);
    }

    #[test]
    fn test_boolean_schema() {
        let v = translated(json!({ "type": "boolean" }));
        assert_eq!(v.kind, ValidatorKind::Boolean);
        assert_eq!(errors_for(&v, json!("true")).len(), 1);
    }

    #[test]
    fn test_array_schema() {
        let v = translated(json!({ "type": "array", "items": { "type": "string" } }));
        assert_eq!(v.kind_name(), "array");
        assert!(errors_for(&v, json!(["a", "b"])).is_empty());
        let errors = errors_for(&v, json!(["a", 2]));
        assert_eq!(errors, vec!["'value[1]' must be a string".to_string()]);
    }

    #[test]
    fn test_object_schema_required_keys() {
        let v = translated(json!({
            "type": "object",
            "properties": { "foo": { "type": "string" }, "bar": { "type": "number" } },
            "required": ["foo"]
        }));
        let ValidatorKind::Object(fields) = &v.kind else {
            panic!("expected object validator");
        };
        assert_eq!(fields[0].0, "foo");
        assert!(fields[0].1.required);
        assert!(!fields[1].1.required);
        assert!(errors_for(&v, json!({ "foo": "x" })).is_empty());
        assert_eq!(errors_for(&v, json!({ "bar": 1 })).len(), 1);
    }

    #[test]
    fn test_untyped_properties_is_object() {
        let v = translated(json!({ "properties": { "x": { "type": "boolean" } } }));
        assert_eq!(v.kind_name(), "object");
    }

    #[test]
    fn test_object_without_properties_is_map() {
        let v = translated(json!({ "type": "object" }));
        assert_eq!(v.kind, ValidatorKind::Map);
        assert!(errors_for(&v, json!({ "anything": [1, 2] })).is_empty());
        assert_eq!(errors_for(&v, json!([1])).len(), 1);
    }

    #[test]
    fn test_one_of_and_any_of_are_unions() {
        let v = translated(json!({ "oneOf": [{ "type": "string" }, { "type": "number" }] }));
        assert_eq!(v.kind_name(), "union");
        assert!(errors_for(&v, json!("a")).is_empty());
        assert!(errors_for(&v, json!(3)).is_empty());
        assert_eq!(errors_for(&v, json!(true)).len(), 1);

        let v = translated(json!({ "anyOf": [{ "type": "boolean" }] }));
        assert_eq!(v.kind_name(), "union");
    }

    #[test]
    fn test_unknown_shape_accepts_anything() {
        let v = translated(json!({ "description": "free-form" }));
        assert_eq!(v.kind, ValidatorKind::Any { note: None });
        assert!(errors_for(&v, json!({ "x": 1 })).is_empty());
    }

    #[test]
    fn test_reference_is_resolved() {
        let v = translated(json!({ "$ref": "#/components/schemas/TestSchema" }));
        assert_eq!(v.kind_name(), "object");
    }

    #[test]
    fn test_broken_reference_falls_back_to_any_with_note() {
        let v = translated(json!({ "$ref": "#/components/schemas/Missing" }));
        let ValidatorKind::Any { note: Some(note) } = &v.kind else {
            panic!("expected annotated any validator");
        };
        assert!(note.contains("Missing"));
    }

    #[test]
    fn test_recursive_reference_terminates() {
        let v = translated(json!({ "$ref": "#/components/schemas/Node" }));
        let ValidatorKind::Object(fields) = &v.kind else {
            panic!("expected object validator");
        };
        let child = &fields.iter().find(|(k, _)| k == "Child").unwrap().1;
        assert_eq!(child.kind_name(), "any");
    }

    #[test]
    fn test_nullable_type_list() {
        let v = translated(json!({ "type": ["null", "string"] }));
        assert_eq!(v.kind_name(), "string");
    }

    #[test]
    fn test_validator_set_validation() {
        let mut set = ValidatorSet::new();
        set.insert("ID", translated(json!({ "type": "string" })));
        set.insert("Limit", translated(json!({ "type": "integer" })).with_required(false));

        let args = json!({ "ID": "42", "Limit": null, "Unknown": true });
        let accepted = set.validate(args.as_object().unwrap()).unwrap();
        assert_eq!(Value::Object(accepted), json!({ "ID": "42" }));

        let err = set.validate(json!({ "Limit": 10 }).as_object().unwrap()).unwrap_err();
        assert_eq!(err.0, vec!["Missing required parameter 'ID'".to_string()]);

        let err = set
            .validate(json!({ "ID": "42", "Limit": "ten" }).as_object().unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("'Limit' must be a number"));
    }

    #[test]
    fn test_input_schema_shape() {
        let mut set = ValidatorSet::new();
        set.insert(
            "Status",
            translated(json!({ "type": "string", "enum": ["sent", "opened"], "description": "Delivery status" })),
        );
        set.insert("Limit", translated(json!({ "type": "integer", "maximum": 1000 })).with_required(false));

        let schema = Value::Object(set.to_input_schema());
        assert_eq!(schema["type"], json!("object"));
        assert_eq!(schema["required"], json!(["Status"]));
        assert_eq!(schema["properties"]["Status"]["enum"], json!(["sent", "opened"]));
        assert_eq!(schema["properties"]["Status"]["description"], json!("Delivery status"));
        assert_eq!(schema["properties"]["Limit"]["maximum"], json!(1000.0));
    }

    #[test]
    fn test_any_note_surfaces_in_schema_description() {
        let v = Validator::any_with_note("Unresolved reference: #/x");
        assert_eq!(
            v.to_json_schema(),
            json!({ "description": "(Unresolved reference: #/x)" })
        );
    }
}
