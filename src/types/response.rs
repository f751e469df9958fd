//! Inference responses, streamed inference chunks, and the small acknowledgement
//! records returned by feedback and evaluation calls.
//!
//! Chat and JSON results carry no discriminator on the wire; they are told apart by
//! shape. A chat response has a `content` array and a JSON response an `output` object.
//! Chunks use `content` versus `raw` the same way.

use super::chunk::ContentBlockChunk;
use super::content::ContentBlock;
use crate::variant::{decode_payload, take_array, Family, Variant};
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCall,
    ContentFilter,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatInferenceResponse {
    pub inference_id: Uuid,
    pub episode_id: Uuid,
    pub variant_name: String,
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_response: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonInferenceOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonInferenceResponse {
    pub inference_id: Uuid,
    pub episode_id: Uuid,
    pub variant_name: String,
    pub output: JsonInferenceOutput,
    pub usage: Usage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_response: Option<String>,
}

/// Result of a non-streaming inference.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceResponse {
    Chat(ChatInferenceResponse),
    Json(JsonInferenceResponse),
}

impl InferenceResponse {
    pub fn decode(value: Value) -> Result<Self> {
        const FAMILY: &str = "inference_response";
        let mut map = match value {
            Value::Object(map) => map,
            _ => return Err(Error::unknown_variant(FAMILY, None)),
        };
        if matches!(map.get("content"), Some(Value::Array(_))) {
            let raw = take_array(FAMILY, "chat", &mut map, "content")?;
            let content = ContentBlock::registry().decode_all(raw)?;
            map.insert("content".into(), Value::Array(Vec::new()));
            let mut chat: ChatInferenceResponse = decode_payload(FAMILY, "chat", map)?;
            chat.content = content;
            Ok(InferenceResponse::Chat(chat))
        } else if matches!(map.get("output"), Some(Value::Object(_))) {
            decode_payload(FAMILY, "json", map).map(InferenceResponse::Json)
        } else {
            Err(Error::unknown_variant(FAMILY, None))
        }
    }

    pub fn inference_id(&self) -> Uuid {
        match self {
            InferenceResponse::Chat(r) => r.inference_id,
            InferenceResponse::Json(r) => r.inference_id,
        }
    }

    pub fn episode_id(&self) -> Uuid {
        match self {
            InferenceResponse::Chat(r) => r.episode_id,
            InferenceResponse::Json(r) => r.episode_id,
        }
    }

    pub fn variant_name(&self) -> &str {
        match self {
            InferenceResponse::Chat(r) => &r.variant_name,
            InferenceResponse::Json(r) => &r.variant_name,
        }
    }

    pub fn usage(&self) -> Usage {
        match self {
            InferenceResponse::Chat(r) => r.usage,
            InferenceResponse::Json(r) => r.usage,
        }
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        match self {
            InferenceResponse::Chat(r) => r.finish_reason,
            InferenceResponse::Json(r) => r.finish_reason,
        }
    }

    pub fn original_response(&self) -> Option<&str> {
        match self {
            InferenceResponse::Chat(r) => r.original_response.as_deref(),
            InferenceResponse::Json(r) => r.original_response.as_deref(),
        }
    }

    pub fn as_chat(&self) -> Option<&ChatInferenceResponse> {
        match self {
            InferenceResponse::Chat(r) => Some(r),
            InferenceResponse::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&JsonInferenceResponse> {
        match self {
            InferenceResponse::Chat(_) => None,
            InferenceResponse::Json(r) => Some(r),
        }
    }
}

impl Variant for InferenceResponse {
    fn variant_type(&self) -> &'static str {
        match self {
            InferenceResponse::Chat(_) => "chat",
            InferenceResponse::Json(_) => "json",
        }
    }
}

impl Serialize for InferenceResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            InferenceResponse::Chat(r) => r.serialize(serializer),
            InferenceResponse::Json(r) => r.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for InferenceResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::decode(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChunk {
    pub inference_id: Uuid,
    pub episode_id: Uuid,
    pub variant_name: String,
    pub content: Vec<ContentBlockChunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonChunk {
    pub inference_id: Uuid,
    pub episode_id: Uuid,
    pub variant_name: String,
    pub raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

/// One incremental unit of a streamed inference.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceChunk {
    Chat(ChatChunk),
    Json(JsonChunk),
}

impl InferenceChunk {
    pub fn decode(value: Value) -> Result<Self> {
        const FAMILY: &str = "inference_chunk";
        let mut map = match value {
            Value::Object(map) => map,
            _ => return Err(Error::unknown_variant(FAMILY, None)),
        };
        if matches!(map.get("content"), Some(Value::Array(_))) {
            let raw = take_array(FAMILY, "chat", &mut map, "content")?;
            let content = ContentBlockChunk::registry().decode_all(raw)?;
            map.insert("content".into(), Value::Array(Vec::new()));
            let mut chunk: ChatChunk = decode_payload(FAMILY, "chat", map)?;
            chunk.content = content;
            Ok(InferenceChunk::Chat(chunk))
        } else if matches!(map.get("raw"), Some(Value::String(_))) {
            decode_payload(FAMILY, "json", map).map(InferenceChunk::Json)
        } else {
            Err(Error::unknown_variant(FAMILY, None))
        }
    }

    pub fn inference_id(&self) -> Uuid {
        match self {
            InferenceChunk::Chat(c) => c.inference_id,
            InferenceChunk::Json(c) => c.inference_id,
        }
    }

    pub fn episode_id(&self) -> Uuid {
        match self {
            InferenceChunk::Chat(c) => c.episode_id,
            InferenceChunk::Json(c) => c.episode_id,
        }
    }

    pub fn variant_name(&self) -> &str {
        match self {
            InferenceChunk::Chat(c) => &c.variant_name,
            InferenceChunk::Json(c) => &c.variant_name,
        }
    }

    pub fn usage(&self) -> Option<Usage> {
        match self {
            InferenceChunk::Chat(c) => c.usage,
            InferenceChunk::Json(c) => c.usage,
        }
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        match self {
            InferenceChunk::Chat(c) => c.finish_reason,
            InferenceChunk::Json(c) => c.finish_reason,
        }
    }
}

impl Variant for InferenceChunk {
    fn variant_type(&self) -> &'static str {
        match self {
            InferenceChunk::Chat(_) => "chat",
            InferenceChunk::Json(_) => "json",
        }
    }
}

impl Serialize for InferenceChunk {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            InferenceChunk::Chat(c) => c.serialize(serializer),
            InferenceChunk::Json(c) => c.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for InferenceChunk {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::decode(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub feedback_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicEvaluationRunResponse {
    pub run_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicEvaluationRunEpisodeResponse {
    pub episode_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const INF: &str = "01968d04-142c-7e53-8ea7-3a3255b518dc";
    const EP: &str = "01968d04-142c-7e53-8ea7-3a3255b518dd";

    #[test]
    fn usage_total_saturates() {
        let usage: Usage =
            serde_json::from_value(json!({"input_tokens": u32::MAX, "output_tokens": 10})).unwrap();
        assert_eq!(usage.total(), u32::MAX);
    }

    #[test]
    fn chat_response_by_shape() {
        let resp = InferenceResponse::decode(json!({
            "inference_id": INF,
            "episode_id": EP,
            "variant_name": "gpt",
            "content": [
                {"type": "text", "text": "Hi"},
                {"type": "x_provider_block", "model_provider_name": "acme"}
            ],
            "usage": {"input_tokens": 3, "output_tokens": 1},
            "finish_reason": "stop"
        }))
        .unwrap();
        assert_eq!(resp.variant_type(), "chat");
        assert_eq!(resp.variant_name(), "gpt");
        assert_eq!(resp.usage().total(), 4);
        assert_eq!(resp.finish_reason(), Some(FinishReason::Stop));
        let chat = resp.as_chat().unwrap();
        assert_eq!(chat.content[0].as_text(), Some("Hi"));
        assert!(chat.content[1].is_unknown());
        assert!(resp.original_response().is_none());
    }

    #[test]
    fn json_response_by_shape() {
        let resp = InferenceResponse::decode(json!({
            "inference_id": INF,
            "episode_id": EP,
            "variant_name": "v",
            "output": {"raw": "{\"a\":1}", "parsed": {"a": 1}},
            "usage": {"input_tokens": 1, "output_tokens": 1},
            "original_response": "{...}"
        }))
        .unwrap();
        let json_resp = resp.as_json().unwrap();
        assert_eq!(json_resp.output.parsed.as_ref().unwrap()["a"], json!(1));
        assert_eq!(resp.original_response(), Some("{...}"));
        let back = serde_json::to_value(&resp).unwrap();
        assert_eq!(InferenceResponse::decode(back).unwrap(), resp);
    }

    #[test]
    fn unrecognized_shape_is_unknown_variant() {
        assert!(matches!(
            InferenceResponse::decode(json!({"inference_id": INF})),
            Err(Error::UnknownVariant {
                family: "inference_response",
                ..
            })
        ));
        assert!(matches!(
            InferenceChunk::decode(json!([])),
            Err(Error::UnknownVariant { .. })
        ));
    }

    #[test]
    fn chunk_with_bogus_block_is_unknown_variant() {
        let err = InferenceChunk::decode(json!({
            "inference_id": INF,
            "episode_id": EP,
            "variant_name": "v",
            "content": [{"type": "bogus", "id": "0"}]
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownVariant {
                family: "content_block_chunk",
                ..
            }
        ));
    }

    #[test]
    fn json_chunk_round_trips() {
        let chunk = InferenceChunk::decode(json!({
            "inference_id": INF,
            "episode_id": EP,
            "variant_name": "v",
            "raw": "{\"par",
            "usage": {"input_tokens": 2, "output_tokens": 5}
        }))
        .unwrap();
        assert_eq!(chunk.variant_type(), "json");
        assert_eq!(chunk.usage(), Some(Usage { input_tokens: 2, output_tokens: 5 }));
        let v = serde_json::to_value(&chunk).unwrap();
        assert!(v.get("finish_reason").is_none());
        assert_eq!(serde_json::from_value::<InferenceChunk>(v).unwrap(), chunk);
    }
}
