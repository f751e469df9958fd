//! Inference request and its builder.

use super::message::InferenceInput;
use super::tool::{Tool, ToolChoice};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// A JSON-pointer edit applied to the provider request body by the gateway.
///
/// Scoped either to one variant or to one model provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraBody {
    Variant {
        variant_name: String,
        pointer: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delete: Option<bool>,
    },
    Provider {
        model_provider_name: String,
        pointer: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delete: Option<bool>,
    },
}

impl ExtraBody {
    pub fn for_variant(
        variant_name: impl Into<String>,
        pointer: impl Into<String>,
        value: Value,
    ) -> Self {
        ExtraBody::Variant {
            variant_name: variant_name.into(),
            pointer: pointer.into(),
            value: Some(value),
            delete: None,
        }
    }

    pub fn for_provider(
        model_provider_name: impl Into<String>,
        pointer: impl Into<String>,
        value: Value,
    ) -> Self {
        ExtraBody::Provider {
            model_provider_name: model_provider_name.into(),
            pointer: pointer.into(),
            value: Some(value),
            delete: None,
        }
    }
}

/// Body of `POST /inference`. Every unset field is left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub input: InferenceInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dryrun: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_tools: Option<Vec<Tool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_options: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_body: Option<Vec<ExtraBody>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<Vec<Map<String, Value>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_original_response: Option<bool>,
}

impl InferenceRequest {
    pub fn builder(input: InferenceInput) -> InferenceRequestBuilder {
        InferenceRequestBuilder::new(input)
    }

    /// Whether the call targets a configured function (as opposed to a bare model).
    pub fn targets_function(&self) -> bool {
        self.function_name.is_some()
    }
}

/// Builder for [`InferenceRequest`].
///
/// Each method sets exactly one field; calling it again replaces the previous value.
/// Nothing is validated here; the gateway is the authority on what combinations it
/// accepts.
#[derive(Debug, Clone)]
pub struct InferenceRequestBuilder {
    request: InferenceRequest,
}

impl InferenceRequestBuilder {
    pub fn new(input: InferenceInput) -> Self {
        Self {
            request: InferenceRequest {
                input,
                ..InferenceRequest::default()
            },
        }
    }

    pub fn input(mut self, input: InferenceInput) -> Self {
        self.request.input = input;
        self
    }

    pub fn function_name(mut self, name: impl Into<String>) -> Self {
        self.request.function_name = Some(name.into());
        self
    }

    pub fn model_name(mut self, name: impl Into<String>) -> Self {
        self.request.model_name = Some(name.into());
        self
    }

    pub fn episode_id(mut self, id: Uuid) -> Self {
        self.request.episode_id = Some(id);
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.request.stream = Some(stream);
        self
    }

    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.request.params = Some(params);
        self
    }

    pub fn variant_name(mut self, name: impl Into<String>) -> Self {
        self.request.variant_name = Some(name.into());
        self
    }

    pub fn dryrun(mut self, dryrun: bool) -> Self {
        self.request.dryrun = Some(dryrun);
        self
    }

    pub fn output_schema(mut self, schema: Value) -> Self {
        self.request.output_schema = Some(schema);
        self
    }

    pub fn allowed_tools(mut self, tools: Vec<String>) -> Self {
        self.request.allowed_tools = Some(tools);
        self
    }

    pub fn additional_tools(mut self, tools: Vec<Tool>) -> Self {
        self.request.additional_tools = Some(tools);
        self
    }

    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.request.tool_choice = Some(choice);
        self
    }

    pub fn parallel_tool_calls(mut self, parallel: bool) -> Self {
        self.request.parallel_tool_calls = Some(parallel);
        self
    }

    pub fn internal(mut self, internal: bool) -> Self {
        self.request.internal = Some(internal);
        self
    }

    pub fn tags(mut self, tags: HashMap<String, String>) -> Self {
        self.request.tags = Some(tags);
        self
    }

    pub fn credentials(mut self, credentials: HashMap<String, String>) -> Self {
        self.request.credentials = Some(credentials);
        self
    }

    pub fn cache_options(mut self, options: Map<String, Value>) -> Self {
        self.request.cache_options = Some(options);
        self
    }

    pub fn extra_body(mut self, extra_body: Vec<ExtraBody>) -> Self {
        self.request.extra_body = Some(extra_body);
        self
    }

    pub fn extra_headers(mut self, headers: Vec<Map<String, Value>>) -> Self {
        self.request.extra_headers = Some(headers);
        self
    }

    pub fn include_original_response(mut self, include: bool) -> Self {
        self.request.include_original_response = Some(include);
        self
    }

    pub fn build(self) -> InferenceRequest {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::message::Message;
    use serde_json::json;

    fn input() -> InferenceInput {
        InferenceInput::new(vec![Message::user("Hello")])
    }

    #[test]
    fn unset_fields_are_omitted() {
        let req = InferenceRequest::builder(input())
            .function_name("basic_test")
            .build();
        let v = serde_json::to_value(&req).unwrap();
        let keys: Vec<_> = v.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["function_name".to_string(), "input".to_string()]);
    }

    #[test]
    fn last_write_wins() {
        let req = InferenceRequest::builder(input())
            .model_name("openai::gpt-4o-mini")
            .model_name("anthropic::claude")
            .stream(true)
            .stream(false)
            .tool_choice(ToolChoice::Auto)
            .tool_choice(ToolChoice::Specific("lookup".into()))
            .build();
        assert_eq!(req.model_name.as_deref(), Some("anthropic::claude"));
        assert_eq!(req.stream, Some(false));
        assert_eq!(req.tool_choice, Some(ToolChoice::Specific("lookup".into())));
        assert!(!req.targets_function());
    }

    #[test]
    fn every_field_lands_under_its_wire_name() {
        let episode = Uuid::new_v4();
        let mut params = Map::new();
        params.insert("chat_completion".into(), json!({"temperature": 0.2}));
        let req = InferenceRequest::builder(input())
            .function_name("f")
            .episode_id(episode)
            .params(params)
            .variant_name("v")
            .dryrun(true)
            .output_schema(json!({"type": "object"}))
            .allowed_tools(vec!["a".into()])
            .additional_tools(vec![Tool::new("b", "desc", json!({}))])
            .parallel_tool_calls(false)
            .internal(true)
            .tags(HashMap::from([("k".to_string(), "v".to_string())]))
            .credentials(HashMap::from([("key".to_string(), "secret".to_string())]))
            .extra_body(vec![ExtraBody::for_variant("v", "/temperature", json!(1))])
            .extra_headers(vec![Map::new()])
            .include_original_response(true)
            .build();
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["episode_id"], json!(episode.to_string()));
        assert_eq!(v["params"]["chat_completion"]["temperature"], json!(0.2));
        assert_eq!(v["additional_tools"][0]["name"], json!("b"));
        assert_eq!(
            v["extra_body"][0],
            json!({"variant_name": "v", "pointer": "/temperature", "value": 1})
        );
        assert_eq!(v["include_original_response"], json!(true));
        assert!(v.get("cache_options").is_none());
        assert!(v.get("stream").is_none());
    }
}
