//! Dataset entries: inserts sent to the gateway and stored datapoints read back.

use super::message::InferenceInput;
use super::tool::{Tool, ToolChoice, ToolParams};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatDatapointInsert {
    pub function_name: String,
    pub input: InferenceInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonDatapointInsert {
    pub function_name: String,
    pub input: InferenceInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

/// A datapoint to insert into a dataset, shaped for a chat or a JSON function.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DatapointInsert {
    Chat(ChatDatapointInsert),
    Json(JsonDatapointInsert),
}

impl DatapointInsert {
    pub fn chat(function_name: impl Into<String>, input: InferenceInput) -> Self {
        DatapointInsert::Chat(ChatDatapointInsert {
            function_name: function_name.into(),
            input,
            output: None,
            allowed_tools: None,
            additional_tools: None,
            tool_choice: None,
            parallel_tool_calls: None,
            tags: HashMap::new(),
        })
    }

    pub fn json(function_name: impl Into<String>, input: InferenceInput) -> Self {
        DatapointInsert::Json(JsonDatapointInsert {
            function_name: function_name.into(),
            input,
            output: None,
            output_schema: None,
            tags: HashMap::new(),
        })
    }

    pub fn function_name(&self) -> &str {
        match self {
            DatapointInsert::Chat(d) => &d.function_name,
            DatapointInsert::Json(d) => &d.function_name,
        }
    }

    pub fn with_output(mut self, output: Value) -> Self {
        match &mut self {
            DatapointInsert::Chat(d) => d.output = Some(output),
            DatapointInsert::Json(d) => d.output = Some(output),
        }
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match &mut self {
            DatapointInsert::Chat(d) => d.tags.insert(key.into(), value.into()),
            DatapointInsert::Json(d) => d.tags.insert(key.into(), value.into()),
        };
        self
    }
}

/// A datapoint as stored by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datapoint {
    pub id: Uuid,
    pub input: InferenceInput,
    #[serde(default)]
    pub output: Value,
    pub dataset_name: String,
    pub function_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_params: Option<ToolParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    #[serde(default)]
    pub is_custom: bool,
}

/// Query for `GET /datasets/{dataset_name}/datapoints`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDatapointsRequest {
    pub dataset_name: String,
    pub function_name: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListDatapointsRequest {
    pub fn new(dataset_name: impl Into<String>) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            function_name: None,
            limit: None,
            offset: None,
        }
    }

    pub fn function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Query-string pairs, in a stable order, for the set fields only.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(name) = &self.function_name {
            pairs.push(("function_name", name.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::message::Message;
    use serde_json::json;

    #[test]
    fn inserts_serialize_without_a_discriminator() {
        let dp = DatapointInsert::json("extract", InferenceInput::new(vec![Message::user("x")]))
            .with_output(json!({"name": "x"}))
            .with_tag("source", "test");
        assert_eq!(dp.function_name(), "extract");
        let v = serde_json::to_value(&dp).unwrap();
        assert!(v.get("type").is_none());
        assert_eq!(v["output"], json!({"name": "x"}));
        assert_eq!(v["tags"]["source"], json!("test"));
        assert!(v.get("output_schema").is_none());

        let chat = serde_json::to_value(DatapointInsert::chat("chat_fn", InferenceInput::default()))
            .unwrap();
        assert_eq!(chat, json!({"function_name": "chat_fn", "input": {}}));
    }

    #[test]
    fn list_query_only_carries_set_fields() {
        let req = ListDatapointsRequest::new("ds").limit(5);
        assert_eq!(req.query_pairs(), vec![("limit", "5".to_string())]);
        let req = ListDatapointsRequest::new("ds").function_name("f").offset(2).limit(1);
        assert_eq!(
            req.query_pairs(),
            vec![
                ("function_name", "f".to_string()),
                ("limit", "1".to_string()),
                ("offset", "2".to_string())
            ]
        );
    }

    #[test]
    fn stored_datapoint_decodes() {
        let dp: Datapoint = serde_json::from_value(json!({
            "id": "01968d04-142c-7e53-8ea7-3a3255b518dc",
            "input": {"messages": []},
            "output": [{"type": "text", "text": "hi"}],
            "dataset_name": "ds",
            "function_name": "f"
        }))
        .unwrap();
        assert!(!dp.is_custom);
        assert!(dp.tool_params.is_none());
    }
}
