use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Represents a parameter in a tool's input schema
#[derive(Debug, Clone, Serialize)]
pub struct ParameterProperty {
    /// The type of the parameter (e.g. "string", "number", "array", etc)
    #[serde(rename = "type")]
    pub property_type: String,
    /// Description of what the parameter does
    pub description: String,
    /// When type is "array", this defines the type of the array items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ParameterProperty>>,
    /// Closed set of allowed values
    #[serde(skip_serializing_if = "Option::is_none", rename = "enum")]
    pub enum_list: Option<Vec<String>>,
}

impl ParameterProperty {
    pub fn new(property_type: &str, description: &str) -> Self {
        Self {
            property_type: property_type.to_string(),
            description: description.to_string(),
            items: None,
            enum_list: None,
        }
    }
}

/// Represents the input schema of a tool
#[derive(Debug, Clone, Serialize)]
pub struct ParametersSchema {
    /// The type of the parameters object (usually "object")
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Map of parameter names to their properties
    pub properties: BTreeMap<String, ParameterProperty>,
    /// List of required parameter names
    pub required: Vec<String>,
}

impl Default for ParametersSchema {
    fn default() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

/// A tool advertised to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Name of the tool
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema describing the input
    pub input_schema: Value,
}

impl ToolSchema {
    pub fn new(name: &str, description: &str, parameters: &ParametersSchema) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: serde_json::to_value(parameters).unwrap_or(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_serializes_as_json_schema_object() {
        let mut params = ParametersSchema::default();
        params.properties.insert(
            "file_path".into(),
            ParameterProperty::new("string", "Absolute path"),
        );
        params.required.push("file_path".into());

        let schema = ToolSchema::new("Read", "Read a file", &params);
        assert_eq!(
            schema.input_schema,
            json!({
                "type": "object",
                "properties": {"file_path": {"type": "string", "description": "Absolute path"}},
                "required": ["file_path"]
            })
        );
    }
}
