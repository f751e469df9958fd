//! Feedback submission.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Metric or demonstration feedback for one inference or one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub metric_name: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dryrun: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal: Option<bool>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

impl FeedbackRequest {
    pub fn builder(metric_name: impl Into<String>, value: impl Into<Value>) -> FeedbackRequestBuilder {
        FeedbackRequestBuilder::new(metric_name, value)
    }
}

/// Builder for [`FeedbackRequest`]. Later calls overwrite earlier ones.
#[derive(Debug, Clone)]
pub struct FeedbackRequestBuilder {
    request: FeedbackRequest,
}

impl FeedbackRequestBuilder {
    pub fn new(metric_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            request: FeedbackRequest {
                metric_name: metric_name.into(),
                value: value.into(),
                inference_id: None,
                episode_id: None,
                dryrun: None,
                internal: None,
                tags: HashMap::new(),
            },
        }
    }

    pub fn inference_id(mut self, id: Uuid) -> Self {
        self.request.inference_id = Some(id);
        self
    }

    pub fn episode_id(mut self, id: Uuid) -> Self {
        self.request.episode_id = Some(id);
        self
    }

    pub fn dryrun(mut self, dryrun: bool) -> Self {
        self.request.dryrun = Some(dryrun);
        self
    }

    pub fn internal(mut self, internal: bool) -> Self {
        self.request.internal = Some(internal);
        self
    }

    pub fn tags(mut self, tags: HashMap<String, String>) -> Self {
        self.request.tags = tags;
        self
    }

    pub fn build(self) -> FeedbackRequest {
        self.request
    }
}
