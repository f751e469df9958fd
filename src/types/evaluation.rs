//! Dynamic evaluation runs: pin variants for a run, then open episodes under it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicEvaluationRunRequest {
    /// function name -> pinned variant name
    pub variants: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl DynamicEvaluationRunRequest {
    pub fn new(variants: HashMap<String, String>) -> Self {
        Self {
            variants,
            ..Self::default()
        }
    }

    pub fn pin(mut self, function_name: impl Into<String>, variant_name: impl Into<String>) -> Self {
        self.variants.insert(function_name.into(), variant_name.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicEvaluationRunEpisodeRequest {
    pub run_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datapoint_name: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

impl DynamicEvaluationRunEpisodeRequest {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            task_name: None,
            datapoint_name: None,
            tags: HashMap::new(),
        }
    }

    pub fn with_task_name(mut self, name: impl Into<String>) -> Self {
        self.task_name = Some(name.into());
        self
    }

    pub fn with_datapoint_name(mut self, name: impl Into<String>) -> Self {
        self.datapoint_name = Some(name.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}
