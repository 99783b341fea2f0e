use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Normalized tool arguments, keyed by parameter name.
pub type ToolArguments = Map<String, Value>;

#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("arguments are not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("arguments must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParameter {
    pub name: String,
    pub kind: String,
    pub description: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Add a required string parameter.
    pub fn param(self, name: &str, description: &str) -> Self {
        self.with_param(name, "string", description, true)
    }

    pub fn with_param(mut self, name: &str, kind: &str, description: &str, required: bool) -> Self {
        self.parameters.push(ToolParameter {
            name: name.to_string(),
            kind: kind.to_string(),
            description: description.to_string(),
            required,
        });
        self
    }

    /// Function-tool form sent to the inference server.
    pub fn to_wire(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    json!({ "type": p.kind, "description": p.description }),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required
                }
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub function: ToolFunction,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            function: ToolFunction {
                name: name.into(),
                arguments,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Normalize a raw argument payload into a key/value map.
///
/// Models send either an object or a string holding serialized JSON; both end
/// up as the same map. A missing payload means no arguments.
pub fn decode_arguments(raw: &Value) -> Result<ToolArguments, ArgumentError> {
    match raw {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(ToolArguments::new()),
        Value::String(text) if text.trim().is_empty() => Ok(ToolArguments::new()),
        Value::String(text) => match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(map),
            other => Err(ArgumentError::NotAnObject(kind_name(&other))),
        },
        other => Err(ArgumentError::NotAnObject(kind_name(other))),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Text(String),
    Json(Value),
}

impl ToolOutput {
    pub fn render(&self) -> String {
        match self {
            ToolOutput::Text(text) => text.clone(),
            ToolOutput::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

impl From<String> for ToolOutput {
    fn from(text: String) -> Self {
        ToolOutput::Text(text)
    }
}
