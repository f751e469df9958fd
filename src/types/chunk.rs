//! Incremental content fragments emitted while an inference streams.

use crate::types::content::{ContentBlock, Thought, ToolCall};
use crate::variant::{
    decode_payload, deserialize_via_registry, serialize_tagged, Family, Variant, VariantRegistry,
};
use crate::Result;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

const FAMILY: &str = "content_block_chunk";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallChunk {
    pub id: String,
    pub raw_arguments: String,
    pub raw_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThoughtChunk {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// One fragment of a content block. Fragments sharing an `id` belong to the same block.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlockChunk {
    Text(TextChunk),
    ToolCall(ToolCallChunk),
    Thought(ThoughtChunk),
}

impl ContentBlockChunk {
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        ContentBlockChunk::Text(TextChunk {
            id: id.into(),
            text: text.into(),
        })
    }

    pub fn tool_call(
        id: impl Into<String>,
        raw_arguments: impl Into<String>,
        raw_name: impl Into<String>,
    ) -> Self {
        ContentBlockChunk::ToolCall(ToolCallChunk {
            id: id.into(),
            raw_arguments: raw_arguments.into(),
            raw_name: raw_name.into(),
        })
    }

    pub fn thought(id: impl Into<String>, text: impl Into<String>) -> Self {
        ContentBlockChunk::Thought(ThoughtChunk {
            id: id.into(),
            text: text.into(),
            signature: None,
        })
    }

    pub fn id(&self) -> &str {
        match self {
            ContentBlockChunk::Text(c) => &c.id,
            ContentBlockChunk::ToolCall(c) => &c.id,
            ContentBlockChunk::Thought(c) => &c.id,
        }
    }
}

impl Variant for ContentBlockChunk {
    fn variant_type(&self) -> &'static str {
        match self {
            ContentBlockChunk::Text(_) => "text",
            ContentBlockChunk::ToolCall(_) => "tool_call",
            ContentBlockChunk::Thought(_) => "thought",
        }
    }
}

impl Serialize for ContentBlockChunk {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let tag = self.variant_type();
        match self {
            ContentBlockChunk::Text(p) => serialize_tagged(tag, p, serializer),
            ContentBlockChunk::ToolCall(p) => serialize_tagged(tag, p, serializer),
            ContentBlockChunk::Thought(p) => serialize_tagged(tag, p, serializer),
        }
    }
}

deserialize_via_registry!(ContentBlockChunk);

static REGISTRY: VariantRegistry<ContentBlockChunk> = VariantRegistry::strict(
    FAMILY,
    &[
        ("text", decode_text),
        ("tool_call", decode_tool_call),
        ("thought", decode_thought),
    ],
);

fn decode_text(map: Map<String, Value>) -> Result<ContentBlockChunk> {
    decode_payload(FAMILY, "text", map).map(ContentBlockChunk::Text)
}

fn decode_tool_call(map: Map<String, Value>) -> Result<ContentBlockChunk> {
    decode_payload(FAMILY, "tool_call", map).map(ContentBlockChunk::ToolCall)
}

fn decode_thought(map: Map<String, Value>) -> Result<ContentBlockChunk> {
    decode_payload(FAMILY, "thought", map).map(ContentBlockChunk::Thought)
}

impl Family for ContentBlockChunk {
    fn registry() -> &'static VariantRegistry<Self> {
        &REGISTRY
    }
}

/// Folds streamed fragments back into whole content blocks.
///
/// Fragments are concatenated per `id` in arrival order. Blocks come out in the order
/// their first fragment was seen. A fragment whose kind differs from the one already
/// open under the same `id` starts a new block.
#[derive(Debug, Default)]
pub struct ChunkMerger {
    blocks: Vec<Partial>,
}

#[derive(Debug)]
enum Partial {
    Text {
        id: String,
        text: String,
    },
    ToolCall {
        id: String,
        raw_arguments: String,
        raw_name: String,
    },
    Thought {
        id: String,
        text: String,
        signature: Option<String>,
    },
}

impl Partial {
    fn matches(&self, chunk: &ContentBlockChunk) -> bool {
        match (self, chunk) {
            (Partial::Text { id, .. }, ContentBlockChunk::Text(c)) => *id == c.id,
            (Partial::ToolCall { id, .. }, ContentBlockChunk::ToolCall(c)) => *id == c.id,
            (Partial::Thought { id, .. }, ContentBlockChunk::Thought(c)) => *id == c.id,
            _ => false,
        }
    }

    fn append(&mut self, chunk: &ContentBlockChunk) {
        match (self, chunk) {
            (Partial::Text { text, .. }, ContentBlockChunk::Text(c)) => text.push_str(&c.text),
            (
                Partial::ToolCall {
                    raw_arguments,
                    raw_name,
                    ..
                },
                ContentBlockChunk::ToolCall(c),
            ) => {
                raw_arguments.push_str(&c.raw_arguments);
                if !c.raw_name.is_empty() {
                    *raw_name = c.raw_name.clone();
                }
            }
            (Partial::Thought { text, signature, .. }, ContentBlockChunk::Thought(c)) => {
                text.push_str(&c.text);
                if c.signature.is_some() {
                    *signature = c.signature.clone();
                }
            }
            _ => {}
        }
    }
}

impl ChunkMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &ContentBlockChunk) {
        if let Some(open) = self.blocks.iter_mut().rev().find(|p| p.matches(chunk)) {
            open.append(chunk);
            return;
        }
        self.blocks.push(match chunk {
            ContentBlockChunk::Text(c) => Partial::Text {
                id: c.id.clone(),
                text: c.text.clone(),
            },
            ContentBlockChunk::ToolCall(c) => Partial::ToolCall {
                id: c.id.clone(),
                raw_arguments: c.raw_arguments.clone(),
                raw_name: c.raw_name.clone(),
            },
            ContentBlockChunk::Thought(c) => Partial::Thought {
                id: c.id.clone(),
                text: c.text.clone(),
                signature: c.signature.clone(),
            },
        });
    }

    pub fn extend<'a>(&mut self, chunks: impl IntoIterator<Item = &'a ContentBlockChunk>) {
        for chunk in chunks {
            self.push(chunk);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Tool calls come out with only their raw fields set.
    pub fn finish(self) -> Vec<ContentBlock> {
        self.blocks
            .into_iter()
            .map(|p| match p {
                Partial::Text { text, .. } => ContentBlock::text(text),
                Partial::ToolCall {
                    id,
                    raw_arguments,
                    raw_name,
                } => ContentBlock::ToolCall(ToolCall::new(id, raw_arguments, raw_name)),
                Partial::Thought {
                    text, signature, ..
                } => ContentBlock::Thought(Thought {
                    text: Some(text),
                    signature,
                }),
            })
            .collect()
    }
}
