//! Gateway client.
//!
//! [`Gateway`] is the seam between application code and the TensorZero gateway;
//! [`HttpGateway`] implements it over HTTP. Implementation details live in
//! submodules under `src/client/`.

pub mod builder;
pub mod gateway;
pub mod http;

pub use builder::HttpGatewayBuilder;
pub use gateway::Gateway;
pub use http::HttpGateway;
