use crate::{BoxStream, Error, ErrorContext, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Thin wrapper over a pooled `reqwest::Client` bound to one gateway base URL.
///
/// `request_timeout` bounds whole non-streaming calls only. Event streams are bounded
/// by the connect timeout and stay open as long as the gateway keeps them open.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    request_timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;
        let mut transport = Self::with_client(client, base_url)?;
        transport.request_timeout = Some(timeout);
        Ok(transport)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim_end_matches('/');
        let base_url = Url::parse(trimmed)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "invalid gateway base URL",
                    ErrorContext::new()
                        .with_field_path("base_url")
                        .with_details(trimmed.to_string())
                        .with_source("http_transport"),
                )
            })?;
        Ok(Self {
            client,
            base_url,
            request_timeout: None,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::internal("gateway base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and hand back the response once its status is one of `accepted`.
    ///
    /// Any other status is read to text and surfaced as [`Error::Gateway`].
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&B>,
        accept_event_stream: bool,
        accepted: &[StatusCode],
    ) -> Result<reqwest::Response> {
        let url = self.endpoint(segments)?;
        let mut req = self.client.request(method.clone(), url.clone());
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        if accept_event_stream {
            req = req.header(reqwest::header::ACCEPT, "text/event-stream");
        } else if let Some(timeout) = self.request_timeout {
            req = req.timeout(timeout);
        }

        tracing::debug!(%method, %url, "dispatching gateway request");
        let response = req
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        let status = response.status();
        if accepted.contains(&status) {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
        tracing::warn!(%method, %url, status = status.as_u16(), "gateway returned an error status");
        Err(Error::Gateway {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn byte_stream(response: reqwest::Response) -> BoxStream<'static, Bytes> {
        Box::pin(
            response
                .bytes_stream()
                .map_err(|e| Error::Transport(TransportError::Http(e))),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
