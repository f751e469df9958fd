//! Content blocks carried by messages and chat responses.
//!
//! Wire shape: `{"type": "text" | "raw_text" | "image" | "file" | "tool_call" |
//! "tool_result" | "thought" | "unknown", ...}`. `image` and `file` are split into
//! base64 and URL variants by which of `data` / `url` is present.
//!
//! This is the only open family: a block whose discriminator is missing or not known
//! to this client decodes to [`ContentBlock::Unknown`] holding the untouched object,
//! so content types added by new model providers pass through instead of failing the
//! whole response.

use crate::variant::{
    decode_payload, deserialize_via_registry, serialize_tagged, Family, Variant, VariantRegistry,
};
use crate::{Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::path::Path;

const FAMILY: &str = "content_block";

/// Text content: either a literal string or template arguments, never both.
///
/// Serializes as `{"text": ...}` or `{"arguments": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Text {
    #[serde(rename = "text")]
    Literal(String),
    #[serde(rename = "arguments")]
    Arguments(Map<String, Value>),
}

impl Text {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Text::Literal(s) => Some(s),
            Text::Arguments(_) => None,
        }
    }

    pub fn arguments(&self) -> Option<&Map<String, Value>> {
        match self {
            Text::Literal(_) => None,
            Text::Arguments(args) => Some(args),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawText {
    pub value: String,
}

/// Base64 payloads are stored as given; they are not re-validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBase64 {
    pub data: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileBase64 {
    pub data: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUrl {
    pub url: String,
}

/// A tool invocation requested by the model.
///
/// `raw_name` and `raw_arguments` are exactly what the provider sent and are the
/// authoritative fields. `name` and `arguments` are filled in by the gateway only when
/// it could resolve and parse them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub raw_arguments: String,
    pub raw_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        raw_arguments: impl Into<String>,
        raw_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            raw_arguments: raw_arguments.into(),
            raw_name: raw_name.into(),
            arguments: None,
            name: None,
        }
    }

    pub fn with_arguments(mut self, arguments: Map<String, Value>) -> Self {
        self.arguments = Some(arguments);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Parse `raw_arguments` locally. Independent of the gateway-provided `arguments`.
    pub fn parse_raw_arguments(&self) -> Result<Map<String, Value>> {
        match serde_json::from_str::<Value>(&self.raw_arguments)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::malformed(
                FAMILY,
                "tool_call",
                "raw_arguments is not a JSON object",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub name: String,
    pub result: String,
    pub id: String,
}

/// Model reasoning. `signature` is a provider-specific opaque attestation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thought {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Thought {
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }
}

/// Content the client has no model for, kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownContentBlock {
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_provider_name: Option<String>,
}

/// One piece of message or response content.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(Text),
    RawText(RawText),
    ImageBase64(ImageBase64),
    ImageUrl(ImageUrl),
    FileBase64(FileBase64),
    FileUrl(FileUrl),
    ToolCall(ToolCall),
    ToolResult(ToolResult),
    Thought(Thought),
    Unknown(UnknownContentBlock),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text(Text::Literal(text.into()))
    }

    /// Structured template arguments, rendered by the function's templates on the gateway.
    pub fn arguments(arguments: Map<String, Value>) -> Self {
        ContentBlock::Text(Text::Arguments(arguments))
    }

    pub fn raw_text(value: impl Into<String>) -> Self {
        ContentBlock::RawText(RawText {
            value: value.into(),
        })
    }

    pub fn image_base64(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        ContentBlock::ImageBase64(ImageBase64 {
            data: data.into(),
            mime_type: mime_type.into(),
        })
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        ContentBlock::ImageUrl(ImageUrl {
            url: url.into(),
            mime_type: None,
        })
    }

    pub fn image_url_with_mime_type(url: impl Into<String>, mime_type: impl Into<String>) -> Self {
        ContentBlock::ImageUrl(ImageUrl {
            url: url.into(),
            mime_type: Some(mime_type.into()),
        })
    }

    pub fn file_base64(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        ContentBlock::FileBase64(FileBase64 {
            data: data.into(),
            mime_type: mime_type.into(),
        })
    }

    pub fn file_url(url: impl Into<String>) -> Self {
        ContentBlock::FileUrl(FileUrl { url: url.into() })
    }

    pub fn tool_call(
        id: impl Into<String>,
        raw_arguments: impl Into<String>,
        raw_name: impl Into<String>,
    ) -> Self {
        ContentBlock::ToolCall(ToolCall::new(id, raw_arguments, raw_name))
    }

    pub fn tool_result(
        name: impl Into<String>,
        result: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        ContentBlock::ToolResult(ToolResult {
            name: name.into(),
            result: result.into(),
            id: id.into(),
        })
    }

    pub fn thought(text: impl Into<String>) -> Self {
        ContentBlock::Thought(Thought {
            text: Some(text.into()),
            signature: None,
        })
    }

    pub fn unknown(data: Value) -> Self {
        ContentBlock::Unknown(UnknownContentBlock {
            data,
            model_provider_name: None,
        })
    }

    /// Read a local image and embed it as base64.
    pub fn image_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let (data, mime_type) = read_base64(path.as_ref())?;
        Ok(Self::image_base64(data, mime_type))
    }

    /// Read a local file (e.g. a PDF) and embed it as base64.
    pub fn file_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let (data, mime_type) = read_base64(path.as_ref())?;
        Ok(Self::file_base64(data, mime_type))
    }

    /// The literal text of a `text` block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text(t) => t.as_str(),
            _ => None,
        }
    }

    pub fn as_tool_call(&self) -> Option<&ToolCall> {
        match self {
            ContentBlock::ToolCall(tc) => Some(tc),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ContentBlock::Unknown(_))
    }
}

impl Variant for ContentBlock {
    fn variant_type(&self) -> &'static str {
        match self {
            ContentBlock::Text(_) => "text",
            ContentBlock::RawText(_) => "raw_text",
            ContentBlock::ImageBase64(_) | ContentBlock::ImageUrl(_) => "image",
            ContentBlock::FileBase64(_) | ContentBlock::FileUrl(_) => "file",
            ContentBlock::ToolCall(_) => "tool_call",
            ContentBlock::ToolResult(_) => "tool_result",
            ContentBlock::Thought(_) => "thought",
            ContentBlock::Unknown(_) => "unknown",
        }
    }
}

impl Serialize for ContentBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let tag = self.variant_type();
        match self {
            ContentBlock::Text(p) => serialize_tagged(tag, p, serializer),
            ContentBlock::RawText(p) => serialize_tagged(tag, p, serializer),
            ContentBlock::ImageBase64(p) => serialize_tagged(tag, p, serializer),
            ContentBlock::ImageUrl(p) => serialize_tagged(tag, p, serializer),
            ContentBlock::FileBase64(p) => serialize_tagged(tag, p, serializer),
            ContentBlock::FileUrl(p) => serialize_tagged(tag, p, serializer),
            ContentBlock::ToolCall(p) => serialize_tagged(tag, p, serializer),
            ContentBlock::ToolResult(p) => serialize_tagged(tag, p, serializer),
            ContentBlock::Thought(p) => serialize_tagged(tag, p, serializer),
            ContentBlock::Unknown(p) => serialize_tagged(tag, p, serializer),
        }
    }
}

deserialize_via_registry!(ContentBlock);

static REGISTRY: VariantRegistry<ContentBlock> = VariantRegistry::open(
    FAMILY,
    &[
        ("text", decode_text),
        ("raw_text", decode_raw_text),
        ("image", decode_image),
        ("file", decode_file),
        ("tool_call", decode_tool_call),
        ("tool_result", decode_tool_result),
        ("thought", decode_thought),
        ("unknown", decode_unknown),
    ],
    unknown_fallback,
);

impl Family for ContentBlock {
    fn registry() -> &'static VariantRegistry<Self> {
        &REGISTRY
    }
}

fn decode_text(mut map: Map<String, Value>) -> Result<ContentBlock> {
    let text = map.remove("text").filter(|v| !v.is_null());
    let arguments = map.remove("arguments").filter(|v| !v.is_null());
    let text = match (text, arguments) {
        (Some(Value::String(s)), None) => Text::Literal(s),
        (None, Some(Value::Object(args))) => Text::Arguments(args),
        (Some(_), Some(_)) => {
            return Err(Error::malformed(
                FAMILY,
                "text",
                "`text` and `arguments` are mutually exclusive",
            ))
        }
        (None, None) => {
            return Err(Error::malformed(
                FAMILY,
                "text",
                "missing field `text` or `arguments`",
            ))
        }
        (Some(_), None) => return Err(Error::malformed(FAMILY, "text", "`text` must be a string")),
        (None, Some(_)) => {
            return Err(Error::malformed(
                FAMILY,
                "text",
                "`arguments` must be an object",
            ))
        }
    };
    Ok(ContentBlock::Text(text))
}

fn decode_raw_text(map: Map<String, Value>) -> Result<ContentBlock> {
    decode_payload(FAMILY, "raw_text", map).map(ContentBlock::RawText)
}

fn decode_image(map: Map<String, Value>) -> Result<ContentBlock> {
    if map.contains_key("data") {
        decode_payload(FAMILY, "image", map).map(ContentBlock::ImageBase64)
    } else if map.contains_key("url") {
        decode_payload(FAMILY, "image", map).map(ContentBlock::ImageUrl)
    } else {
        Err(Error::malformed(FAMILY, "image", "missing field `data` or `url`"))
    }
}

fn decode_file(map: Map<String, Value>) -> Result<ContentBlock> {
    if map.contains_key("data") {
        decode_payload(FAMILY, "file", map).map(ContentBlock::FileBase64)
    } else if map.contains_key("url") {
        decode_payload(FAMILY, "file", map).map(ContentBlock::FileUrl)
    } else {
        Err(Error::malformed(FAMILY, "file", "missing field `data` or `url`"))
    }
}

fn decode_tool_call(map: Map<String, Value>) -> Result<ContentBlock> {
    decode_payload(FAMILY, "tool_call", map).map(ContentBlock::ToolCall)
}

fn decode_tool_result(map: Map<String, Value>) -> Result<ContentBlock> {
    decode_payload(FAMILY, "tool_result", map).map(ContentBlock::ToolResult)
}

fn decode_thought(map: Map<String, Value>) -> Result<ContentBlock> {
    decode_payload(FAMILY, "thought", map).map(ContentBlock::Thought)
}

fn decode_unknown(map: Map<String, Value>) -> Result<ContentBlock> {
    decode_payload(FAMILY, "unknown", map).map(ContentBlock::Unknown)
}

fn unknown_fallback(map: Map<String, Value>) -> ContentBlock {
    let model_provider_name = map
        .get("model_provider_name")
        .and_then(Value::as_str)
        .map(str::to_string);
    let discriminator = map
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("<missing>");
    tracing::debug!(discriminator, "capturing unrecognized content block");
    ContentBlock::Unknown(UnknownContentBlock {
        data: Value::Object(map),
        model_provider_name,
    })
}

fn read_base64(path: &Path) -> Result<(String, String)> {
    let bytes = std::fs::read(path)?;
    let mime_type = guess_mime_type(path).ok_or_else(|| {
        Error::validation_with_context(
            "cannot infer mime type from file extension",
            crate::ErrorContext::new()
                .with_field_path(path.display().to_string())
                .with_source("content_block"),
        )
    })?;
    let data = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok((data, mime_type.to_string()))
}

fn guess_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    let mt = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(mt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn round_trip(block: ContentBlock) {
        let encoded = block.encode().unwrap();
        assert_eq!(
            encoded.get("type").and_then(Value::as_str),
            Some(block.variant_type())
        );
        let decoded = ContentBlock::decode(encoded).unwrap();
        assert_eq!(decoded, block);
    }

    #[test]
    fn every_variant_round_trips() {
        let mut args = Map::new();
        args.insert("name".into(), json!("Ada"));

        round_trip(ContentBlock::text("hello"));
        round_trip(ContentBlock::arguments(args.clone()));
        round_trip(ContentBlock::raw_text("raw"));
        round_trip(ContentBlock::image_base64("aGVsbG8=", "image/png"));
        round_trip(ContentBlock::image_url("https://example.com/cat.png"));
        round_trip(ContentBlock::image_url_with_mime_type(
            "https://example.com/cat",
            "image/jpeg",
        ));
        round_trip(ContentBlock::file_base64("JVBERi0=", "application/pdf"));
        round_trip(ContentBlock::file_url("https://example.com/doc.pdf"));
        round_trip(ContentBlock::tool_call("call_1", "{\"q\":1}", "search"));
        round_trip(ContentBlock::ToolCall(
            ToolCall::new("call_2", "{\"q\":1}", "search")
                .with_arguments(args)
                .with_name("search"),
        ));
        round_trip(ContentBlock::tool_result("search", "42", "call_1"));
        round_trip(ContentBlock::thought("hmm"));
        round_trip(ContentBlock::Thought(Thought::default().with_signature("sig")));
        round_trip(ContentBlock::unknown(json!({"vendor": [1, 2]})));
    }

    #[test]
    fn text_omits_the_unset_half() {
        let plain = ContentBlock::text("hi").encode().unwrap();
        assert_eq!(plain, json!({"type": "text", "text": "hi"}));
        assert!(plain.get("arguments").is_none());

        let mut args = Map::new();
        args.insert("topic".into(), json!("rust"));
        let templated = ContentBlock::arguments(args).encode().unwrap();
        assert_eq!(
            templated,
            json!({"type": "text", "arguments": {"topic": "rust"}})
        );
        assert!(templated.get("text").is_none());
    }

    #[test]
    fn optional_fields_are_not_emitted_as_null() {
        let v = ContentBlock::image_url("u").encode().unwrap();
        assert_eq!(v, json!({"type": "image", "url": "u"}));
        let v = ContentBlock::tool_call("i", "{}", "f").encode().unwrap();
        assert_eq!(
            v,
            json!({"type": "tool_call", "id": "i", "raw_arguments": "{}", "raw_name": "f"})
        );
    }

    #[test]
    fn bogus_discriminator_becomes_unknown_with_raw_payload() {
        let input = json!({"type": "bogus"});
        let block = ContentBlock::decode(input.clone()).unwrap();
        match block {
            ContentBlock::Unknown(u) => {
                assert_eq!(u.data, input);
                assert_eq!(u.model_provider_name, None);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn unknown_keeps_provider_hint() {
        let input = json!({
            "type": "citations",
            "model_provider_name": "anthropic",
            "cites": [1]
        });
        match ContentBlock::decode(input.clone()).unwrap() {
            ContentBlock::Unknown(u) => {
                assert_eq!(u.data, input);
                assert_eq!(u.model_provider_name.as_deref(), Some("anthropic"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(ContentBlock::decode(json!({"text": "no type"}))
            .unwrap()
            .is_unknown());
    }

    #[test]
    fn missing_mandatory_fields_are_malformed() {
        let cases = [
            json!({"type": "image", "mime_type": "image/png"}),
            json!({"type": "image", "data": "abc"}),
            json!({"type": "file", "data": "abc"}),
            json!({"type": "tool_call", "id": "1", "raw_name": "f"}),
            json!({"type": "tool_result", "name": "f", "id": "1"}),
            json!({"type": "raw_text"}),
            json!({"type": "text"}),
            json!({"type": "text", "text": "a", "arguments": {"b": 1}}),
            json!({"type": "unknown"}),
        ];
        for case in cases {
            assert!(
                matches!(
                    ContentBlock::decode(case.clone()),
                    Err(Error::MalformedContent { .. })
                ),
                "expected malformed for {}",
                case
            );
        }
    }

    #[test]
    fn image_and_file_pick_variant_by_field() {
        assert!(matches!(
            ContentBlock::decode(json!({"type": "image", "data": "x", "mime_type": "image/png"}))
                .unwrap(),
            ContentBlock::ImageBase64(_)
        ));
        assert!(matches!(
            ContentBlock::decode(json!({"type": "file", "url": "https://x"})).unwrap(),
            ContentBlock::FileUrl(_)
        ));
    }

    #[test]
    fn tool_call_raw_fields_survive_failed_parse() {
        let block = ContentBlock::decode(json!({
            "type": "tool_call",
            "id": "c1",
            "raw_name": "get_weather",
            "raw_arguments": "{\"city\": \"Par"
        }))
        .unwrap();
        let tc = block.as_tool_call().unwrap();
        assert_eq!(tc.raw_name, "get_weather");
        assert!(tc.arguments.is_none());
        assert!(tc.name.is_none());
        assert!(tc.parse_raw_arguments().is_err());
    }

    #[test]
    fn image_from_file_guesses_mime_type() {
        let dir = std::env::temp_dir().join(format!("tz-content-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("pixel.png");
        std::fs::write(&path, b"hello").unwrap();

        let block = ContentBlock::image_from_file(&path).unwrap();
        assert_eq!(block, ContentBlock::image_base64("aGVsbG8=", "image/png"));

        let odd = dir.join("blob.xyz");
        std::fs::write(&odd, b"?").unwrap();
        assert!(matches!(
            ContentBlock::file_from_file(&odd),
            Err(Error::Validation { .. })
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
