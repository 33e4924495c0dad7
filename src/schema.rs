// Schema compiler
//
// Turns a tool's declared argument list into a JSON-Schema-shaped input
// contract shared by both transports. Pure: no I/O, deterministic output
// for a given declaration list.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::config::ArgumentDeclaration;

/// Maximum length for a declared argument name.
const MAX_ARGUMENT_NAME_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid argument name '{name}': must be 1-64 characters")]
    InvalidArgumentName { name: String },

    #[error("invalid argument type '{arg_type}': must be one of: string, integer, number, boolean")]
    InvalidArgumentType { arg_type: String },

    #[error("enum value '{literal}' is not a valid {target}")]
    InvalidEnumValue { literal: String, target: ArgType },

    #[error("duplicate argument name '{name}'")]
    DuplicateArgument { name: String },
}

/// The four recognized argument kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ArgType {
    fn parse(s: &str) -> Result<Self, SchemaError> {
        match s {
            "string" => Ok(ArgType::String),
            "integer" => Ok(ArgType::Integer),
            "number" => Ok(ArgType::Number),
            "boolean" => Ok(ArgType::Boolean),
            other => Err(SchemaError::InvalidArgumentType {
                arg_type: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArgType::String => "string",
            ArgType::Integer => "integer",
            ArgType::Number => "number",
            ArgType::Boolean => "boolean",
        };
        f.write_str(s)
    }
}

/// A coerced enum value, typed to match its argument's declared kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
}

impl EnumValue {
    /// Textual form of the value, matching the literal it was coerced from.
    pub fn to_literal(&self) -> String {
        match self {
            EnumValue::Boolean(b) => b.to_string(),
            EnumValue::Integer(n) => n.to_string(),
            EnumValue::Number(f) => f.to_string(),
            EnumValue::String(s) => s.clone(),
        }
    }
}

/// Schema for a single argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub arg_type: ArgType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<EnumValue>,
}

/// JSON Schema for a tool's input parameters.
///
/// `properties` is a BTreeMap so two compiles of the same declaration list
/// serialize identically; MCP tool descriptions and the OpenAPI document are
/// regenerated from this and must be stable across reloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: BTreeMap<String, PropertySchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl ToolInputSchema {
    /// The schema as a JSON object, for MCP tool descriptors.
    pub fn to_json_object(&self) -> serde_json::Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            // A struct with named fields always serializes to an object
            _ => serde_json::Map::new(),
        }
    }
}

/// Compile an argument list into a validated input schema.
pub fn compile(arguments: &[ArgumentDeclaration]) -> Result<ToolInputSchema, SchemaError> {
    let mut properties = BTreeMap::new();
    let mut required = Vec::new();

    for arg in arguments {
        if arg.name.is_empty() || arg.name.len() > MAX_ARGUMENT_NAME_LEN {
            return Err(SchemaError::InvalidArgumentName {
                name: arg.name.clone(),
            });
        }

        let arg_type = ArgType::parse(&arg.arg_type)?;

        let enum_values = arg
            .enum_values
            .iter()
            .map(|literal| coerce_enum_value(literal, arg_type))
            .collect::<Result<Vec<_>, _>>()?;

        let prop = PropertySchema {
            arg_type,
            description: arg.description.clone(),
            enum_values,
        };

        if properties.insert(arg.name.clone(), prop).is_some() {
            return Err(SchemaError::DuplicateArgument {
                name: arg.name.clone(),
            });
        }
        if arg.required {
            required.push(arg.name.clone());
        }
    }

    Ok(ToolInputSchema {
        schema_type: "object".to_string(),
        properties,
        required,
    })
}

/// Coerce a raw enum literal to its argument's declared type.
///
/// Strings are stringified as-is; the other kinds are parsed from the
/// literal's textual form.
fn coerce_enum_value(literal: &Value, target: ArgType) -> Result<EnumValue, SchemaError> {
    let text = literal_text(literal);
    let invalid = || SchemaError::InvalidEnumValue {
        literal: text.clone(),
        target,
    };

    match target {
        ArgType::String => Ok(EnumValue::String(text)),
        ArgType::Integer => text
            .parse::<i64>()
            .map(EnumValue::Integer)
            .map_err(|_| invalid()),
        ArgType::Number => text
            .parse::<f64>()
            .map(EnumValue::Number)
            .map_err(|_| invalid()),
        ArgType::Boolean => text
            .parse::<bool>()
            .map(EnumValue::Boolean)
            .map_err(|_| invalid()),
    }
}

/// Textual form of a raw YAML scalar (strings unquoted).
fn literal_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
