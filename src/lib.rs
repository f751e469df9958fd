//! # tensorzero-client
//!
//! Typed client for the TensorZero inference gateway.
//!
//! ## Overview
//!
//! Every polymorphic object the gateway exchanges carries a `type` discriminator.
//! This crate models each such family as a Rust enum, dispatched through a
//! [`variant::VariantRegistry`], so that a value decoded from the wire encodes back
//! to the same JSON. On top of the data model sit a small HTTP gateway client and a
//! streaming delivery type with separate chunk and error channels.
//!
//! ## Key Features
//!
//! - **Content blocks**: text, tool calls and results, images, files, thoughts, raw
//!   text, and an `unknown` passthrough for block types the client does not know
//! - **Filter trees**: metric, tag and time leaves combined with `and`/`or`/`not`
//! - **Config variants**: functions and their variants, read from JSON or YAML
//! - **Streaming**: [`InferenceStream`] delivers chunks in order, then at most one error
//! - **Gateway**: [`Gateway`] trait with an HTTP implementation, [`HttpGateway`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tensorzero_client::{Gateway, HttpGateway, InferenceInput, InferenceRequest, Message};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> tensorzero_client::Result<()> {
//!     let gateway = HttpGateway::builder()
//!         .base_url("http://localhost:3000")
//!         .build()?;
//!
//!     let request = InferenceRequest::builder(InferenceInput::new(vec![Message::user("Hi")]))
//!         .function_name("basic_test")
//!         .build();
//!
//!     let mut stream = gateway.inference_stream(&request, CancellationToken::new());
//!     while let Some(chunk) = stream.next_chunk().await {
//!         println!("{:?}", chunk);
//!     }
//!     if let Some(err) = stream.error().await {
//!         return Err(err);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`variant`] | Discriminator registries shared by every family |
//! | [`types`] | Content blocks, messages, requests, responses, datapoints |
//! | [`filter`] | Inference filter trees and list queries |
//! | [`config`] | Function and variant configuration, optimization jobs |
//! | [`stream`] | Dual-channel streaming delivery |
//! | [`client`] | Gateway trait, HTTP gateway and its builder |
//! | [`transport`] | HTTP dispatch and SSE framing |

pub mod client;
pub mod config;
pub mod filter;
pub mod stream;
pub mod transport;
pub mod types;
pub mod variant;

// Re-export main types for convenience
pub use client::{Gateway, HttpGateway, HttpGatewayBuilder};
pub use config::{Config, FunctionConfig, VariantConfig};
pub use filter::{FilterNode, ListInferencesRequest, OrderBy};
pub use stream::InferenceStream;
pub use types::{
    ContentBlock, ContentBlockChunk, InferenceChunk, InferenceInput, InferenceRequest,
    InferenceResponse, Message, MessageRole,
};
pub use variant::{Family, Variant};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
