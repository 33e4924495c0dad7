// Declaration model for the YAML tool source
//
// A config file declares a list of tools, each backed by an external
// command with templated arguments.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level config: an ordered list of tool declarations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tools: Vec<ToolDeclaration>,
}

/// A single declared tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Namespace for the tool, e.g. "demo" or "util"
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Command to run when the tool is invoked
    pub run: CommandSpec,
    /// Declared arguments, in order
    #[serde(default)]
    pub input: Vec<ArgumentDeclaration>,
    #[serde(default)]
    pub output: OutputSpec,
}

impl ToolDeclaration {
    /// Registry identity: `namespace/name`.
    pub fn identity(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// The command behind a tool: an executable plus templated arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    pub cmd: String,
    /// Argument templates, expanded against call arguments ({{ name }})
    #[serde(default)]
    pub args: Vec<String>,
}

/// A single declared argument.
///
/// `arg_type` is kept as the raw declared string so the schema compiler
/// reports unknown kinds itself instead of failing at YAML decode time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentDeclaration {
    pub name: String,
    /// JSON schema type (one of: "string", "integer", "number", "boolean")
    #[serde(rename = "type")]
    pub arg_type: String,
    #[serde(default)]
    pub description: String,
    /// Optional enum values, as raw scalar literals
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSpec {
    #[serde(default)]
    pub format: OutputFormat,
}

/// How a tool's raw output bytes are presented to callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Image,
    Audio,
}
