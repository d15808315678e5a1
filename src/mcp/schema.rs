//! Tool parameter schemas.
//!
//! Only the checks MCP clients rely on in practice are implemented: field
//! presence and primitive type, plus a minimum length for strings. There is
//! no cross-field validation.

use serde_json::{Map, Value, json};
use thiserror::Error;

/// Primitive JSON type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Integer,
    Boolean,
}

impl ParamKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }
}

/// A single named parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    pub description: Option<String>,
    pub min_length: Option<usize>,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: None,
            min_length: None,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind)
        }
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    fn json_schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".into(), json!(self.kind.as_str()));
        if let Some(desc) = &self.description {
            prop.insert("description".into(), json!(desc));
        }
        if let Some(min) = self.min_length {
            prop.insert("minLength".into(), json!(min));
        }
        Value::Object(prop)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("arguments must be a JSON object")]
    NotAnObject,
    #[error("missing required field '{0}'")]
    MissingField(String),
    #[error("field '{field}' must be of type {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
    #[error("field '{field}' must be at least {min} characters")]
    TooShort { field: String, min: usize },
}

/// Set of parameters accepted by a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSchema {
    fields: Vec<ParamSpec>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, spec: ParamSpec) -> Self {
        self.fields.retain(|f| f.name != spec.name);
        self.fields.push(spec);
        self
    }

    pub fn fields(&self) -> &[ParamSpec] {
        &self.fields
    }

    /// Check `args` against the schema. `null` counts as an empty object.
    pub fn validate(&self, args: &Value) -> Result<(), ValidationError> {
        let empty = Map::new();
        let obj = match args {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(ValidationError::NotAnObject),
        };

        for spec in &self.fields {
            let Some(value) = obj.get(&spec.name).filter(|v| !v.is_null()) else {
                if spec.required {
                    return Err(ValidationError::MissingField(spec.name.clone()));
                }
                continue;
            };

            if !spec.kind.matches(value) {
                return Err(ValidationError::WrongType {
                    field: spec.name.clone(),
                    expected: spec.kind.as_str(),
                });
            }

            if let (Some(min), Some(s)) = (spec.min_length, value.as_str()) {
                if s.chars().count() < min {
                    return Err(ValidationError::TooShort {
                        field: spec.name.clone(),
                        min,
                    });
                }
            }
        }

        Ok(())
    }

    /// JSON Schema object used as a tool's `inputSchema`.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_schema() -> ParamSchema {
        ParamSchema::new()
            .field(ParamSpec::required("id", ParamKind::Number))
            .field(ParamSpec::required("completed", ParamKind::Boolean))
    }

    #[test]
    fn test_missing_required_field() {
        let err = update_schema().validate(&json!({"id": 1})).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("completed".into()));
    }

    #[test]
    fn test_wrong_type() {
        let err = update_schema()
            .validate(&json!({"id": "1", "completed": true}))
            .unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { ref field, expected: "number" } if field == "id"));
    }

    #[test]
    fn test_null_arguments_and_optional_fields() {
        let schema = ParamSchema::new().field(ParamSpec::optional("note", ParamKind::String));
        assert!(schema.validate(&Value::Null).is_ok());
        assert!(schema.validate(&json!({"note": null})).is_ok());
        assert_eq!(
            schema.validate(&json!([1, 2])),
            Err(ValidationError::NotAnObject)
        );
    }

    #[test]
    fn test_min_length() {
        let schema =
            ParamSchema::new().field(ParamSpec::required("title", ParamKind::String).min_length(1));
        assert!(schema.validate(&json!({"title": "a"})).is_ok());
        assert!(matches!(
            schema.validate(&json!({"title": ""})),
            Err(ValidationError::TooShort { min: 1, .. })
        ));
    }

    #[test]
    fn test_integer_rejects_fractions() {
        let schema = ParamSchema::new().field(ParamSpec::required("n", ParamKind::Integer));
        assert!(schema.validate(&json!({"n": 3})).is_ok());
        assert!(schema.validate(&json!({"n": 3.5})).is_err());
    }

    #[test]
    fn test_json_schema_shape() {
        let schema = update_schema()
            .field(ParamSpec::optional("note", ParamKind::String).describe("free text"))
            .to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["id"]["type"], "number");
        assert_eq!(schema["properties"]["note"]["description"], "free text");
        assert_eq!(schema["required"], json!(["id", "completed"]));
    }
}
