//! Wire types exchanged with the gateway.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`content`] | Content blocks (the one open variant family) |
//! | [`chunk`] | Streamed content fragments and [`ChunkMerger`] |
//! | [`message`] | Messages, system prompt, inference input |
//! | [`response`] | Inference responses, inference chunks, acknowledgements |
//! | [`request`] | Inference request and its builder |
//! | [`tool`] | Tool definitions and tool choice |
//! | [`datapoint`] | Dataset inserts and stored datapoints |
//! | [`feedback`] | Feedback request and builder |
//! | [`evaluation`] | Dynamic evaluation runs and episodes |
//!
//! ## Example
//!
//! ```rust
//! use tensorzero_client::types::{InferenceInput, InferenceRequest, Message};
//!
//! let request = InferenceRequest::builder(InferenceInput::new(vec![Message::user("Hi")]))
//!     .function_name("basic_test")
//!     .build();
//! assert_eq!(request.function_name.as_deref(), Some("basic_test"));
//! ```

pub mod chunk;
pub mod content;
pub mod datapoint;
pub mod evaluation;
pub mod feedback;
pub mod message;
pub mod request;
pub mod response;
pub mod tool;

pub use chunk::{ChunkMerger, ContentBlockChunk, TextChunk, ThoughtChunk, ToolCallChunk};
pub use content::{
    ContentBlock, FileBase64, FileUrl, ImageBase64, ImageUrl, RawText, Text, Thought, ToolCall,
    ToolResult, UnknownContentBlock,
};
pub use datapoint::{
    ChatDatapointInsert, Datapoint, DatapointInsert, JsonDatapointInsert, ListDatapointsRequest,
};
pub use evaluation::{DynamicEvaluationRunEpisodeRequest, DynamicEvaluationRunRequest};
pub use feedback::{FeedbackRequest, FeedbackRequestBuilder};
pub use message::{InferenceInput, Message, MessageRole, System};
pub use request::{ExtraBody, InferenceRequest, InferenceRequestBuilder};
pub use response::{
    ChatChunk, ChatInferenceResponse, DynamicEvaluationRunEpisodeResponse,
    DynamicEvaluationRunResponse, FeedbackResponse, FinishReason, InferenceChunk,
    InferenceResponse, JsonChunk, JsonInferenceOutput, JsonInferenceResponse, Usage,
};
pub use tool::{Tool, ToolChoice, ToolParams};
