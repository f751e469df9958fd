//! Tool definitions and tool-selection settings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool the model may call. `parameters` is a JSON Schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    #[serde(default)]
    pub strict: bool,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// How the model may use tools.
///
/// Serializes as `"none"`, `"auto"`, `"required"` or `{"specific": "<tool name>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    None,
    Auto,
    Required,
    Specific(String),
}

/// Tool configuration recorded with a stored inference or datapoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParams {
    #[serde(default)]
    pub tools_available: Vec<Tool>,
    pub tool_choice: ToolChoice,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_choice_wire_forms() {
        assert_eq!(serde_json::to_value(ToolChoice::Auto).unwrap(), json!("auto"));
        assert_eq!(
            serde_json::to_value(ToolChoice::Specific("get_weather".into())).unwrap(),
            json!({"specific": "get_weather"})
        );
        let parsed: ToolChoice = serde_json::from_value(json!("required")).unwrap();
        assert_eq!(parsed, ToolChoice::Required);
    }

    #[test]
    fn tool_params_decode() {
        let params: ToolParams = serde_json::from_value(json!({
            "tools_available": [{
                "name": "get_weather",
                "description": "Weather lookup",
                "parameters": {"type": "object"},
                "strict": true
            }],
            "tool_choice": "auto"
        }))
        .unwrap();
        assert!(params.tools_available[0].strict);
        assert_eq!(params.parallel_tool_calls, None);
    }
}
