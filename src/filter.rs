//! Boolean filter trees for listing stored inferences.
//!
//! A [`FilterNode`] is either a leaf predicate (metric, tag, or time comparison) or a
//! branch (`and`, `or`, `not`) over other nodes. Trees are built and serialized here
//! and evaluated by the gateway; nothing in this module evaluates a filter.
//!
//! ```rust
//! use tensorzero_client::filter::{self, ComparisonOperator, FilterNode, TagComparisonOperator};
//!
//! let tree = filter::and([
//!     FilterNode::float_metric("accuracy", 0.8, ComparisonOperator::GreaterThanOrEqual),
//!     !FilterNode::tag("env", "staging", TagComparisonOperator::Equal),
//! ]);
//! assert_eq!(tree.depth(), 3);
//! assert_eq!(tree.leaf_count(), 2);
//! ```

use crate::types::message::InferenceInput;
use crate::types::tool::ToolParams;
use crate::variant::{
    decode_payload, deserialize_via_registry, serialize_tagged, take_array, take_required, Family,
    Variant, VariantRegistry,
};
use crate::Result;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

const FAMILY: &str = "filter";

/// Comparison for float-metric and time leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "!=")]
    NotEqual,
}

/// Comparison for tag leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagComparisonOperator {
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatMetricFilter {
    pub metric_name: String,
    pub value: f64,
    pub comparison_operator: ComparisonOperator,
}

/// Boolean metrics compare by equality only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanMetricFilter {
    pub metric_name: String,
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    pub key: String,
    pub value: String,
    pub comparison_operator: TagComparisonOperator,
}

/// `time` is an RFC 3339 timestamp, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFilter {
    pub time: String,
    pub comparison_operator: ComparisonOperator,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    FloatMetric(FloatMetricFilter),
    BooleanMetric(BooleanMetricFilter),
    Tag(TagFilter),
    Time(TimeFilter),
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
    Not(Box<FilterNode>),
}

impl FilterNode {
    pub fn float_metric(
        metric_name: impl Into<String>,
        value: f64,
        comparison_operator: ComparisonOperator,
    ) -> Self {
        FilterNode::FloatMetric(FloatMetricFilter {
            metric_name: metric_name.into(),
            value,
            comparison_operator,
        })
    }

    pub fn boolean_metric(metric_name: impl Into<String>, value: bool) -> Self {
        FilterNode::BooleanMetric(BooleanMetricFilter {
            metric_name: metric_name.into(),
            value,
        })
    }

    pub fn tag(
        key: impl Into<String>,
        value: impl Into<String>,
        comparison_operator: TagComparisonOperator,
    ) -> Self {
        FilterNode::Tag(TagFilter {
            key: key.into(),
            value: value.into(),
            comparison_operator,
        })
    }

    pub fn time(time: impl Into<String>, comparison_operator: ComparisonOperator) -> Self {
        FilterNode::Time(TimeFilter {
            time: time.into(),
            comparison_operator,
        })
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self, FilterNode::And(_) | FilterNode::Or(_) | FilterNode::Not(_))
    }

    pub fn children(&self) -> &[FilterNode] {
        match self {
            FilterNode::And(children) | FilterNode::Or(children) => children,
            FilterNode::Not(child) => std::slice::from_ref(child.as_ref()),
            _ => &[],
        }
    }

    /// Height of the tree; a leaf (or an empty branch) has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(FilterNode::depth).max().unwrap_or(0)
    }

    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children().iter().map(FilterNode::leaf_count).sum()
        }
    }
}

/// Conjunction of `children`. An empty conjunction is sent as-is.
pub fn and(children: impl IntoIterator<Item = FilterNode>) -> FilterNode {
    FilterNode::And(children.into_iter().collect())
}

/// Disjunction of `children`. An empty disjunction is sent as-is.
pub fn or(children: impl IntoIterator<Item = FilterNode>) -> FilterNode {
    FilterNode::Or(children.into_iter().collect())
}

pub fn not(child: FilterNode) -> FilterNode {
    FilterNode::Not(Box::new(child))
}

impl std::ops::Not for FilterNode {
    type Output = FilterNode;

    fn not(self) -> FilterNode {
        not(self)
    }
}

impl Variant for FilterNode {
    fn variant_type(&self) -> &'static str {
        match self {
            FilterNode::FloatMetric(_) => "float_metric",
            FilterNode::BooleanMetric(_) => "boolean_metric",
            FilterNode::Tag(_) => "tag",
            FilterNode::Time(_) => "time",
            FilterNode::And(_) => "and",
            FilterNode::Or(_) => "or",
            FilterNode::Not(_) => "not",
        }
    }
}

#[derive(Serialize)]
struct Branch<'a> {
    children: &'a [FilterNode],
}

#[derive(Serialize)]
struct Negation<'a> {
    child: &'a FilterNode,
}

impl Serialize for FilterNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let tag = self.variant_type();
        match self {
            FilterNode::FloatMetric(p) => serialize_tagged(tag, p, serializer),
            FilterNode::BooleanMetric(p) => serialize_tagged(tag, p, serializer),
            FilterNode::Tag(p) => serialize_tagged(tag, p, serializer),
            FilterNode::Time(p) => serialize_tagged(tag, p, serializer),
            FilterNode::And(children) | FilterNode::Or(children) => {
                serialize_tagged(tag, &Branch { children }, serializer)
            }
            FilterNode::Not(child) => serialize_tagged(tag, &Negation { child }, serializer),
        }
    }
}

deserialize_via_registry!(FilterNode);

static REGISTRY: VariantRegistry<FilterNode> = VariantRegistry::strict(
    FAMILY,
    &[
        ("float_metric", decode_float_metric),
        ("boolean_metric", decode_boolean_metric),
        ("tag", decode_tag),
        ("time", decode_time),
        ("and", decode_and),
        ("or", decode_or),
        ("not", decode_not),
    ],
);

impl Family for FilterNode {
    fn registry() -> &'static VariantRegistry<Self> {
        &REGISTRY
    }
}

fn decode_float_metric(map: Map<String, Value>) -> Result<FilterNode> {
    decode_payload(FAMILY, "float_metric", map).map(FilterNode::FloatMetric)
}

fn decode_boolean_metric(map: Map<String, Value>) -> Result<FilterNode> {
    decode_payload(FAMILY, "boolean_metric", map).map(FilterNode::BooleanMetric)
}

fn decode_tag(map: Map<String, Value>) -> Result<FilterNode> {
    decode_payload(FAMILY, "tag", map).map(FilterNode::Tag)
}

fn decode_time(map: Map<String, Value>) -> Result<FilterNode> {
    decode_payload(FAMILY, "time", map).map(FilterNode::Time)
}

// Children go back through the registry so nested errors keep their kind.
fn decode_and(mut map: Map<String, Value>) -> Result<FilterNode> {
    let children = take_array(FAMILY, "and", &mut map, "children")?;
    REGISTRY.decode_all(children).map(FilterNode::And)
}

fn decode_or(mut map: Map<String, Value>) -> Result<FilterNode> {
    let children = take_array(FAMILY, "or", &mut map, "children")?;
    REGISTRY.decode_all(children).map(FilterNode::Or)
}

fn decode_not(mut map: Map<String, Value>) -> Result<FilterNode> {
    let child = take_required(FAMILY, "not", &mut map, "child")?;
    REGISTRY.decode(child).map(|c| FilterNode::Not(Box::new(c)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "ASC")]
    Ascending,
    #[serde(rename = "DESC")]
    Descending,
}

/// Sort key for listed inferences. Wire shape: `{"by": "timestamp" | "metric", "name"?, "direction"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum OrderBy {
    Timestamp { direction: Direction },
    Metric { name: String, direction: Direction },
}

impl OrderBy {
    pub fn timestamp(direction: Direction) -> Self {
        OrderBy::Timestamp { direction }
    }

    pub fn metric(name: impl Into<String>, direction: Direction) -> Self {
        OrderBy::Metric {
            name: name.into(),
            direction,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            OrderBy::Timestamp { direction } | OrderBy::Metric { direction, .. } => *direction,
        }
    }
}

/// Body of `POST /inferences/list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListInferencesRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl ListInferencesRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    pub fn episode_id(mut self, id: Uuid) -> Self {
        self.episode_id = Some(id);
        self
    }

    pub fn variant_name(mut self, name: impl Into<String>) -> Self {
        self.variant_name = Some(name.into());
        self
    }

    pub fn filter(mut self, filter: FilterNode) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
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
}

/// An inference record returned by `POST /inferences/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredInference {
    pub id: Uuid,
    pub episode_id: Uuid,
    pub function_name: String,
    pub variant_name: String,
    pub input: InferenceInput,
    #[serde(default)]
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_params: Option<ToolParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    /// RFC 3339
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metric_values: Map<String, Value>,
}
