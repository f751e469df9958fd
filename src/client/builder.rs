use crate::client::http::HttpGateway;
use crate::stream::DEFAULT_CHUNK_BUFFER;
use crate::transport::HttpTransport;
use crate::{Error, ErrorContext, Result};
use std::time::Duration;

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Builder for [`HttpGateway`].
///
/// Every knob has a default; [`from_env`](HttpGatewayBuilder::from_env) seeds them from:
/// - `TENSORZERO_GATEWAY_URL` (default `http://localhost:3000`)
/// - `TENSORZERO_TIMEOUT_SECS` (connect and non-streaming request timeout, default 30)
/// - `TENSORZERO_STREAM_BUFFER` (chunk channel capacity, default 10)
///
/// Setters called after `from_env` win.
#[derive(Debug, Clone)]
pub struct HttpGatewayBuilder {
    base_url: String,
    timeout: Duration,
    stream_buffer: usize,
    client: Option<reqwest::Client>,
}

impl HttpGatewayBuilder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            stream_buffer: DEFAULT_CHUNK_BUFFER,
            client: None,
        }
    }

    pub fn from_env() -> Self {
        let mut builder = Self::new();
        if let Ok(url) = std::env::var("TENSORZERO_GATEWAY_URL") {
            if !url.trim().is_empty() {
                builder.base_url = url;
            }
        }
        if let Some(secs) = std::env::var("TENSORZERO_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            builder.timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(n) = std::env::var("TENSORZERO_STREAM_BUFFER")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        {
            builder.stream_buffer = n.max(1);
        }
        builder
    }

    /// Gateway root, e.g. `http://localhost:3000`. A trailing `/` is ignored.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Connect timeout, and whole-request timeout for non-streaming calls.
    ///
    /// Streamed inferences are not cut off by it once connected.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Capacity of the chunk channel of each [`InferenceStream`](crate::stream::InferenceStream).
    pub fn stream_buffer(mut self, n: usize) -> Self {
        self.stream_buffer = n.max(1);
        self
    }

    /// Use a preconfigured `reqwest::Client`. The builder's timeout is then not applied.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<HttpGateway> {
        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                "invalid gateway base URL",
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(format!("{}: {}", self.base_url, e))
                    .with_source("http_gateway_builder"),
            )
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                "gateway base URL must use http or https",
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(self.base_url.clone())
                    .with_source("http_gateway_builder"),
            ));
        }

        let transport = match self.client {
            Some(client) => HttpTransport::with_client(client, &self.base_url)?,
            None => HttpTransport::new(&self.base_url, self.timeout)?,
        };
        tracing::debug!(
            base_url = transport.base_url(),
            stream_buffer = self.stream_buffer,
            "built HTTP gateway"
        );
        Ok(HttpGateway::new(transport, self.stream_buffer))
    }
}

impl Default for HttpGatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let gw = HttpGatewayBuilder::new().build().unwrap();
        assert_eq!(gw.base_url(), DEFAULT_GATEWAY_URL);
        assert_eq!(gw.stream_buffer(), DEFAULT_CHUNK_BUFFER);
    }

    #[test]
    fn setters_apply() {
        let gw = HttpGatewayBuilder::new()
            .base_url("https://gw.internal:8443/")
            .stream_buffer(0)
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(gw.base_url(), "https://gw.internal:8443");
        assert_eq!(gw.stream_buffer(), 1);
    }

    #[test]
    fn rejects_bad_urls() {
        for url in ["not a url", "ftp://gw:21"] {
            let err = HttpGatewayBuilder::new().base_url(url).build().unwrap_err();
            assert_eq!(
                err.context().and_then(|c| c.field_path.as_deref()),
                Some("base_url")
            );
        }
    }
}
