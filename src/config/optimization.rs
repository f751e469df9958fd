//! Fine-tuning job configurations and the handles returned when a job is launched.
//!
//! These are plain data; launching and polling jobs is done by the gateway.

use crate::variant::{
    decode_payload, deserialize_via_registry, serialize_tagged, Family, Variant, VariantRegistry,
};
use crate::Result;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

const CONFIG_FAMILY: &str = "optimization_config";
const HANDLE_FAMILY: &str = "optimization_job_handle";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiSftConfig {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_rate_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_epochs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireworksSftConfig {
    pub model: String,
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcpVertexGeminiSftConfig {
    pub model: String,
    pub bucket_name: String,
    pub project_id: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_rate_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_epochs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_last_checkpoint_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuned_model_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_path_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptimizationConfig {
    OpenAiSft(OpenAiSftConfig),
    FireworksSft(FireworksSftConfig),
    GcpVertexGeminiSft(GcpVertexGeminiSftConfig),
}

impl OptimizationConfig {
    pub fn model(&self) -> &str {
        match self {
            OptimizationConfig::OpenAiSft(c) => &c.model,
            OptimizationConfig::FireworksSft(c) => &c.model,
            OptimizationConfig::GcpVertexGeminiSft(c) => &c.model,
        }
    }
}

impl Variant for OptimizationConfig {
    fn variant_type(&self) -> &'static str {
        match self {
            OptimizationConfig::OpenAiSft(_) => "openai_sft",
            OptimizationConfig::FireworksSft(_) => "fireworks_sft",
            OptimizationConfig::GcpVertexGeminiSft(_) => "gcp_vertex_gemini_sft",
        }
    }
}

impl Serialize for OptimizationConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let tag = self.variant_type();
        match self {
            OptimizationConfig::OpenAiSft(p) => serialize_tagged(tag, p, serializer),
            OptimizationConfig::FireworksSft(p) => serialize_tagged(tag, p, serializer),
            OptimizationConfig::GcpVertexGeminiSft(p) => serialize_tagged(tag, p, serializer),
        }
    }
}

deserialize_via_registry!(OptimizationConfig);

static CONFIG_REGISTRY: VariantRegistry<OptimizationConfig> = VariantRegistry::strict(
    CONFIG_FAMILY,
    &[
        ("openai_sft", decode_openai_sft),
        ("fireworks_sft", decode_fireworks_sft),
        ("gcp_vertex_gemini_sft", decode_gcp_vertex_gemini_sft),
    ],
);

impl Family for OptimizationConfig {
    fn registry() -> &'static VariantRegistry<Self> {
        &CONFIG_REGISTRY
    }
}

fn decode_openai_sft(map: Map<String, Value>) -> Result<OptimizationConfig> {
    decode_payload(CONFIG_FAMILY, "openai_sft", map).map(OptimizationConfig::OpenAiSft)
}

fn decode_fireworks_sft(map: Map<String, Value>) -> Result<OptimizationConfig> {
    decode_payload(CONFIG_FAMILY, "fireworks_sft", map).map(OptimizationConfig::FireworksSft)
}

fn decode_gcp_vertex_gemini_sft(map: Map<String, Value>) -> Result<OptimizationConfig> {
    decode_payload(CONFIG_FAMILY, "gcp_vertex_gemini_sft", map)
        .map(OptimizationConfig::GcpVertexGeminiSft)
}

/// Provider-side identifiers of a launched job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: String,
    /// Provider URLs, job paths, and similar bookkeeping.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Handle for polling a launched job; shares the discriminators of [`OptimizationConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizationJobHandle {
    OpenAiSft(JobHandle),
    FireworksSft(JobHandle),
    GcpVertexGeminiSft(JobHandle),
}

impl OptimizationJobHandle {
    fn handle(&self) -> &JobHandle {
        match self {
            OptimizationJobHandle::OpenAiSft(h)
            | OptimizationJobHandle::FireworksSft(h)
            | OptimizationJobHandle::GcpVertexGeminiSft(h) => h,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.handle().job_id
    }
}

impl Variant for OptimizationJobHandle {
    fn variant_type(&self) -> &'static str {
        match self {
            OptimizationJobHandle::OpenAiSft(_) => "openai_sft",
            OptimizationJobHandle::FireworksSft(_) => "fireworks_sft",
            OptimizationJobHandle::GcpVertexGeminiSft(_) => "gcp_vertex_gemini_sft",
        }
    }
}

impl Serialize for OptimizationJobHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_tagged(self.variant_type(), self.handle(), serializer)
    }
}

deserialize_via_registry!(OptimizationJobHandle);

static HANDLE_REGISTRY: VariantRegistry<OptimizationJobHandle> = VariantRegistry::strict(
    HANDLE_FAMILY,
    &[
        ("openai_sft", decode_openai_handle),
        ("fireworks_sft", decode_fireworks_handle),
        ("gcp_vertex_gemini_sft", decode_gcp_handle),
    ],
);

impl Family for OptimizationJobHandle {
    fn registry() -> &'static VariantRegistry<Self> {
        &HANDLE_REGISTRY
    }
}

fn decode_openai_handle(map: Map<String, Value>) -> Result<OptimizationJobHandle> {
    decode_payload(HANDLE_FAMILY, "openai_sft", map).map(OptimizationJobHandle::OpenAiSft)
}

fn decode_fireworks_handle(map: Map<String, Value>) -> Result<OptimizationJobHandle> {
    decode_payload(HANDLE_FAMILY, "fireworks_sft", map).map(OptimizationJobHandle::FireworksSft)
}

fn decode_gcp_handle(map: Map<String, Value>) -> Result<OptimizationJobHandle> {
    decode_payload(HANDLE_FAMILY, "gcp_vertex_gemini_sft", map)
        .map(OptimizationJobHandle::GcpVertexGeminiSft)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationJobStatus {
    Pending,
    Completed,
    Failed,
}

impl OptimizationJobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OptimizationJobStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationJobInfo {
    pub message: String,
    pub status: OptimizationJobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_finish: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    #[test]
    fn optimization_configs_round_trip() {
        let input = json!({
            "type": "fireworks_sft",
            "model": "accounts/fireworks/models/llama-v3p1-8b-instruct",
            "account_id": "acct"
        });
        let config = OptimizationConfig::decode(input.clone()).unwrap();
        assert_eq!(config.variant_type(), "fireworks_sft");
        assert_eq!(config.encode().unwrap(), input);

        let gcp = OptimizationConfig::decode(json!({
            "type": "gcp_vertex_gemini_sft",
            "model": "gemini-2.0-flash",
            "bucket_name": "b",
            "project_id": "p",
            "region": "us-central1",
            "n_epochs": 3
        }))
        .unwrap();
        assert_eq!(gcp.model(), "gemini-2.0-flash");
    }

    #[test]
    fn job_handle_keeps_provider_fields() {
        let input = json!({
            "type": "openai_sft",
            "job_id": "ftjob-123",
            "job_url": "https://platform.openai.com/finetune/ftjob-123"
        });
        let handle = OptimizationJobHandle::decode(input.clone()).unwrap();
        assert_eq!(handle.job_id(), "ftjob-123");
        assert_eq!(handle.encode().unwrap(), input);
        assert!(matches!(
            OptimizationJobHandle::decode(json!({"type": "together_sft", "job_id": "x"})),
            Err(Error::UnknownVariant { .. })
        ));
    }

    #[test]
    fn job_info_status() {
        let info: OptimizationJobInfo =
            serde_json::from_value(json!({"message": "done", "status": "completed"})).unwrap();
        assert!(info.status.is_terminal());
        assert!(!OptimizationJobStatus::Pending.is_terminal());
    }
}
