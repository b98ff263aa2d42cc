//! Declarative field tables shared by every flow.
//!
//! A table drives three things: the JSON schema advertised to MCP clients,
//! the response schema handed to the completion provider, and the checks
//! applied to candidate input and to the provider's reply.

use serde_json::{json, Map, Value};

use super::errors::{DomainError, FieldViolation, Result};
use super::models::{ToolRequest, ToolResponse};
use super::types::ToolName;

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text,
    TextList,
    OneOf(&'static [&'static str]),
    Records(&'static [FieldSpec]),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ObjectSchema {
    pub fields: &'static [FieldSpec],
}

impl ObjectSchema {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_names(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect()
    }

    /// JSON schema descriptor (draft-07 subset).
    pub fn to_json_schema(&self) -> Value {
        object_descriptor(self.fields)
    }

    /// Input Schema Validator.
    ///
    /// Required text must be non-empty after trimming; literal fields must
    /// match a declared value exactly; optional fields may be absent. Blank
    /// optional text and empty optional lists are dropped so that templates
    /// treat them as absent. Undeclared keys are discarded. Values are kept
    /// verbatim (no trimming). Every violation is reported at once.
    pub fn validate_input(&self, tool: ToolName, candidate: &Value) -> Result<ToolRequest> {
        let Some(obj) = candidate.as_object() else {
            return Err(DomainError::Validation {
                tool: tool.as_str().to_string(),
                fields: vec![FieldViolation::new("arguments", "must be an object")],
            });
        };

        let mut violations = Vec::new();
        let mut accepted = Map::new();

        for spec in self.fields {
            let value = obj.get(spec.name).filter(|v| !v.is_null());
            let Some(value) = value else {
                if spec.required {
                    violations.push(FieldViolation::new(spec.name, "is required"));
                }
                continue;
            };

            match check_input_field(spec, value) {
                Ok(Some(kept)) => {
                    accepted.insert(spec.name.to_string(), kept);
                }
                Ok(None) => {}
                Err(reason) => violations.push(FieldViolation::new(spec.name, reason)),
            }
        }

        if !violations.is_empty() {
            return Err(DomainError::Validation {
                tool: tool.as_str().to_string(),
                fields: violations,
            });
        }
        Ok(ToolRequest::new(tool, accepted))
    }

    /// Output Schema check: the reply must match the table exactly, at every
    /// nesting level. Missing or undeclared keys, wrong types, and unknown
    /// literals are all violations.
    pub fn check_output(&self, tool: ToolName, reply: &Value) -> Result<ToolResponse> {
        let mut violations = Vec::new();
        match reply.as_object() {
            Some(obj) => check_exact_object(self.fields, obj, "", &mut violations),
            None => violations.push(format!(
                "reply must be a JSON object, got {}",
                json_type_name(reply)
            )),
        }

        if !violations.is_empty() {
            return Err(DomainError::SchemaMismatch {
                tool: tool.as_str().to_string(),
                violations,
            });
        }
        let mut fields = reply.as_object().cloned().unwrap_or_default();
        drop_null_optionals(self.fields, &mut fields);
        Ok(ToolResponse::new(tool, fields))
    }
}

/// A checked reply only holds `null` where the field is optional; treat those as absent.
fn drop_null_optionals(fields: &[FieldSpec], obj: &mut Map<String, Value>) {
    obj.retain(|_, value| !value.is_null());
    for spec in fields {
        if let FieldKind::Records(inner) = spec.kind {
            if let Some(Value::Array(items)) = obj.get_mut(spec.name) {
                for item in items.iter_mut().filter_map(Value::as_object_mut) {
                    drop_null_optionals(inner, item);
                }
            }
        }
    }
}

// ── descriptors ───────────────────────────────────────────────────────────────

fn object_descriptor(fields: &[FieldSpec]) -> Value {
    let mut properties = Map::new();
    for spec in fields {
        properties.insert(spec.name.to_string(), field_descriptor(spec));
    }
    let required: Vec<&str> = fields
        .iter()
        .filter(|f| f.required)
        .map(|f| f.name)
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

fn field_descriptor(spec: &FieldSpec) -> Value {
    let mut descriptor = match spec.kind {
        FieldKind::Text => json!({ "type": "string" }),
        FieldKind::TextList => json!({ "type": "array", "items": { "type": "string" } }),
        FieldKind::OneOf(literals) => json!({ "type": "string", "enum": literals }),
        FieldKind::Records(fields) => json!({ "type": "array", "items": object_descriptor(fields) }),
    };
    descriptor["description"] = Value::String(spec.description.to_string());
    descriptor
}

// ── input checks ──────────────────────────────────────────────────────────────

fn check_input_field(spec: &FieldSpec, value: &Value) -> std::result::Result<Option<Value>, String> {
    match spec.kind {
        FieldKind::Text => {
            let text = value.as_str().ok_or("must be a string")?;
            if text.trim().is_empty() {
                if spec.required {
                    return Err("must not be empty".into());
                }
                return Ok(None);
            }
            Ok(Some(value.clone()))
        }
        FieldKind::OneOf(literals) => {
            let text = value.as_str().ok_or("must be a string")?;
            if !literals.contains(&text) {
                return Err(format!("must be one of: {}", literals.join(", ")));
            }
            Ok(Some(value.clone()))
        }
        FieldKind::TextList => {
            let items = value.as_array().ok_or("must be an array of strings")?;
            if items.iter().any(|item| !item.is_string()) {
                return Err("must be an array of strings".into());
            }
            if items.is_empty() {
                if spec.required {
                    return Err("must not be empty".into());
                }
                return Ok(None);
            }
            Ok(Some(value.clone()))
        }
        FieldKind::Records(fields) => {
            let items = value.as_array().ok_or("must be an array of objects")?;
            let mut problems = Vec::new();
            for (idx, item) in items.iter().enumerate() {
                match item.as_object() {
                    Some(obj) => check_exact_object(
                        fields,
                        obj,
                        &format!("{}[{}]", spec.name, idx),
                        &mut problems,
                    ),
                    None => problems.push(format!("{}[{}] must be an object", spec.name, idx)),
                }
            }
            if !problems.is_empty() {
                return Err(problems.join("; "));
            }
            if items.is_empty() && !spec.required {
                return Ok(None);
            }
            Ok(Some(value.clone()))
        }
    }
}

// ── exact structural checks ───────────────────────────────────────────────────

fn check_exact_object(
    fields: &[FieldSpec],
    obj: &Map<String, Value>,
    prefix: &str,
    violations: &mut Vec<String>,
) {
    for spec in fields {
        let path = join_path(prefix, spec.name);
        match obj.get(spec.name) {
            None | Some(Value::Null) => {
                if spec.required {
                    violations.push(format!("'{}' is required", path));
                }
            }
            Some(value) => check_exact_value(spec, value, &path, violations),
        }
    }

    for key in obj.keys() {
        if !fields.iter().any(|f| f.name == key) {
            violations.push(format!("unexpected field '{}'", join_path(prefix, key)));
        }
    }
}

fn check_exact_value(spec: &FieldSpec, value: &Value, path: &str, violations: &mut Vec<String>) {
    match spec.kind {
        FieldKind::Text => {
            if !value.is_string() {
                violations.push(format!(
                    "'{}' must be a string, got {}",
                    path,
                    json_type_name(value)
                ));
            }
        }
        FieldKind::OneOf(literals) => match value.as_str() {
            Some(text) if literals.contains(&text) => {}
            _ => violations.push(format!(
                "'{}' must be one of: {}",
                path,
                literals.join(", ")
            )),
        },
        FieldKind::TextList => match value.as_array() {
            Some(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        violations.push(format!(
                            "'{}[{}]' must be a string, got {}",
                            path,
                            idx,
                            json_type_name(item)
                        ));
                    }
                }
            }
            None => violations.push(format!(
                "'{}' must be an array, got {}",
                path,
                json_type_name(value)
            )),
        },
        FieldKind::Records(fields) => match value.as_array() {
            Some(items) => {
                for (idx, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, idx);
                    match item.as_object() {
                        Some(obj) => check_exact_object(fields, obj, &item_path, violations),
                        None => violations.push(format!(
                            "'{}' must be an object, got {}",
                            item_path,
                            json_type_name(item)
                        )),
                    }
                }
            }
            None => violations.push(format!(
                "'{}' must be an array, got {}",
                path,
                json_type_name(value)
            )),
        },
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
