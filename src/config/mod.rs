//! Gateway configuration as seen by the client: functions and their variants.
//!
//! # Config Layer
//!
//! Functions are a strict variant family (`chat`, `json`), and so are the variants a
//! function can route to. Only the fields the client reasons about are typed; the
//! remaining fields of every variant are carried along untouched so a decoded
//! configuration encodes back to what was read.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`loader`] | Reading a configuration from JSON or YAML text or files |
//! | [`optimization`] | Fine-tuning job configurations, handles and status |
//!
//! ## Example
//!
//! ```rust
//! use tensorzero_client::config::Config;
//! use tensorzero_client::variant::Variant;
//!
//! let config = Config::from_yaml_str(r#"
//! functions:
//!   draft_email:
//!     type: chat
//!     variants:
//!       gpt:
//!         type: chat_completion
//!         model: openai::gpt-4o-mini
//! "#)?;
//! let function = config.function("draft_email").unwrap();
//! assert_eq!(function.variant_type(), "chat");
//! assert_eq!(function.variant("gpt").unwrap().variant_type(), "chat_completion");
//! # Ok::<(), tensorzero_client::Error>(())
//! ```

pub mod loader;
pub mod optimization;

pub use optimization::{
    FireworksSftConfig, GcpVertexGeminiSftConfig, OpenAiSftConfig, OptimizationConfig,
    OptimizationJobHandle, OptimizationJobInfo, OptimizationJobStatus,
};

use crate::variant::{
    decode_payload, deserialize_via_registry, serialize_tagged, Family, Variant, VariantRegistry,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const FUNCTION_FAMILY: &str = "function_config";
const VARIANT_FAMILY: &str = "variant_config";

/// Variants of one function, keyed by variant name.
pub type VariantsConfig = BTreeMap<String, VariantConfig>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionConfig {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_template: Option<String>,
    /// Sampling parameters, weight, and anything else set on the variant.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatCompletionConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_template: None,
            user_template: None,
            assistant_template: None,
            extra: Map::new(),
        }
    }
}

/// Fields of a variant kind the client does not model beyond its discriminator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpaqueVariantConfig {
    pub fields: Map<String, Value>,
}

impl OpaqueVariantConfig {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariantConfig {
    ChatCompletion(ChatCompletionConfig),
    BestOfNSampling(OpaqueVariantConfig),
    Dicl(OpaqueVariantConfig),
    MixtureOfN(OpaqueVariantConfig),
    ChainOfThought(OpaqueVariantConfig),
}

impl VariantConfig {
    pub fn chat_completion(model: impl Into<String>) -> Self {
        VariantConfig::ChatCompletion(ChatCompletionConfig::new(model))
    }

    /// Model name for `chat_completion` variants.
    pub fn model(&self) -> Option<&str> {
        match self {
            VariantConfig::ChatCompletion(c) => Some(&c.model),
            _ => None,
        }
    }
}

impl Variant for VariantConfig {
    fn variant_type(&self) -> &'static str {
        match self {
            VariantConfig::ChatCompletion(_) => "chat_completion",
            VariantConfig::BestOfNSampling(_) => "best_of_n_sampling",
            VariantConfig::Dicl(_) => "dicl",
            VariantConfig::MixtureOfN(_) => "mixture_of_n",
            VariantConfig::ChainOfThought(_) => "chain_of_thought",
        }
    }
}

impl Serialize for VariantConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let tag = self.variant_type();
        match self {
            VariantConfig::ChatCompletion(p) => serialize_tagged(tag, p, serializer),
            VariantConfig::BestOfNSampling(p)
            | VariantConfig::Dicl(p)
            | VariantConfig::MixtureOfN(p)
            | VariantConfig::ChainOfThought(p) => serialize_tagged(tag, p, serializer),
        }
    }
}

deserialize_via_registry!(VariantConfig);

static VARIANT_REGISTRY: VariantRegistry<VariantConfig> = VariantRegistry::strict(
    VARIANT_FAMILY,
    &[
        ("chat_completion", decode_chat_completion),
        ("best_of_n_sampling", decode_best_of_n),
        // older configurations spell it this way
        ("best_of_n", decode_best_of_n),
        ("dicl", decode_dicl),
        ("mixture_of_n", decode_mixture_of_n),
        ("chain_of_thought", decode_chain_of_thought),
    ],
);

impl Family for VariantConfig {
    fn registry() -> &'static VariantRegistry<Self> {
        &VARIANT_REGISTRY
    }
}

fn decode_chat_completion(map: Map<String, Value>) -> Result<VariantConfig> {
    decode_payload(VARIANT_FAMILY, "chat_completion", map).map(VariantConfig::ChatCompletion)
}

fn decode_best_of_n(fields: Map<String, Value>) -> Result<VariantConfig> {
    Ok(VariantConfig::BestOfNSampling(OpaqueVariantConfig { fields }))
}

fn decode_dicl(fields: Map<String, Value>) -> Result<VariantConfig> {
    Ok(VariantConfig::Dicl(OpaqueVariantConfig { fields }))
}

fn decode_mixture_of_n(fields: Map<String, Value>) -> Result<VariantConfig> {
    Ok(VariantConfig::MixtureOfN(OpaqueVariantConfig { fields }))
}

fn decode_chain_of_thought(fields: Map<String, Value>) -> Result<VariantConfig> {
    Ok(VariantConfig::ChainOfThought(OpaqueVariantConfig { fields }))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatFunctionConfig {
    #[serde(default)]
    pub variants: VariantsConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_schema: Option<Value>,
    /// Tools, tool choice, description and other function-level keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonFunctionConfig {
    #[serde(default)]
    pub variants: VariantsConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionConfig {
    Chat(ChatFunctionConfig),
    Json(JsonFunctionConfig),
}

impl FunctionConfig {
    pub fn variants(&self) -> &VariantsConfig {
        match self {
            FunctionConfig::Chat(f) => &f.variants,
            FunctionConfig::Json(f) => &f.variants,
        }
    }

    pub fn variant(&self, name: &str) -> Option<&VariantConfig> {
        self.variants().get(name)
    }

    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.variants().keys().map(String::as_str)
    }
}

impl Variant for FunctionConfig {
    fn variant_type(&self) -> &'static str {
        match self {
            FunctionConfig::Chat(_) => "chat",
            FunctionConfig::Json(_) => "json",
        }
    }
}

impl Serialize for FunctionConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let tag = self.variant_type();
        match self {
            FunctionConfig::Chat(p) => serialize_tagged(tag, p, serializer),
            FunctionConfig::Json(p) => serialize_tagged(tag, p, serializer),
        }
    }
}

deserialize_via_registry!(FunctionConfig);

static FUNCTION_REGISTRY: VariantRegistry<FunctionConfig> = VariantRegistry::strict(
    FUNCTION_FAMILY,
    &[("chat", decode_chat_function), ("json", decode_json_function)],
);

impl Family for FunctionConfig {
    fn registry() -> &'static VariantRegistry<Self> {
        &FUNCTION_REGISTRY
    }
}

fn decode_chat_function(mut map: Map<String, Value>) -> Result<FunctionConfig> {
    let variants = take_variants("chat", &mut map)?;
    let mut function: ChatFunctionConfig = decode_payload(FUNCTION_FAMILY, "chat", map)?;
    function.variants = variants;
    Ok(FunctionConfig::Chat(function))
}

fn decode_json_function(mut map: Map<String, Value>) -> Result<FunctionConfig> {
    let variants = take_variants("json", &mut map)?;
    let mut function: JsonFunctionConfig = decode_payload(FUNCTION_FAMILY, "json", map)?;
    function.variants = variants;
    Ok(FunctionConfig::Json(function))
}

// Variants go through their registry so an unknown variant kind is reported as such.
fn take_variants(function_kind: &str, map: &mut Map<String, Value>) -> Result<VariantsConfig> {
    match map.remove("variants") {
        None | Some(Value::Null) => Ok(VariantsConfig::new()),
        Some(Value::Object(raw)) => raw
            .into_iter()
            .map(|(name, value)| Ok((name, VariantConfig::decode(value)?)))
            .collect(),
        Some(other) => Err(Error::malformed(
            FUNCTION_FAMILY,
            function_kind,
            format!(
                "`variants` must be an object, found {}",
                crate::variant::json_kind(&other)
            ),
        )),
    }
}

/// The functions section of a gateway configuration.
///
/// Other top-level sections (models, metrics, tools) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Config {
    pub functions: BTreeMap<String, FunctionConfig>,
}

impl Config {
    /// Decode from an already-parsed JSON document.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut root = match value {
            Value::Object(map) => map,
            other => {
                return Err(Error::configuration_with_context(
                    "configuration root must be a mapping",
                    crate::ErrorContext::new()
                        .with_details(format!("found {}", crate::variant::json_kind(&other)))
                        .with_source("config_loader"),
                ))
            }
        };
        let functions = match root.remove("functions") {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(raw)) => raw
                .into_iter()
                .map(|(name, value)| Ok((name, FunctionConfig::decode(value)?)))
                .collect::<Result<_>>()?,
            Some(other) => {
                return Err(Error::configuration_with_context(
                    "`functions` must be a mapping",
                    crate::ErrorContext::new()
                        .with_field_path("functions")
                        .with_details(format!("found {}", crate::variant::json_kind(&other)))
                        .with_source("config_loader"),
                ))
            }
        };
        Ok(Self { functions })
    }

    pub fn function(&self, name: &str) -> Option<&FunctionConfig> {
        self.functions.get(name)
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl<'de> Deserialize<'de> for Config {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}
