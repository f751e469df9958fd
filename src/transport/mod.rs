//! HTTP plumbing shared by gateway calls: request dispatch and SSE framing.

pub mod http;
pub mod sse;

pub use http::{HttpTransport, TransportError};
pub use sse::{SseEvent, SseFramer};
