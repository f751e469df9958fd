use crate::client::builder::HttpGatewayBuilder;
use crate::client::gateway::Gateway;
use crate::filter::{ListInferencesRequest, StoredInference};
use crate::stream::InferenceStream;
use crate::transport::{sse, HttpTransport};
use crate::types::{
    Datapoint, DatapointInsert, DynamicEvaluationRunEpisodeRequest,
    DynamicEvaluationRunEpisodeResponse, DynamicEvaluationRunRequest,
    DynamicEvaluationRunResponse, FeedbackRequest, FeedbackResponse, InferenceChunk,
    InferenceRequest, InferenceResponse, ListDatapointsRequest,
};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use futures::{stream, Future, StreamExt, TryStreamExt};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// [`Gateway`] over HTTP.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    transport: HttpTransport,
    stream_buffer: usize,
}

#[derive(Serialize)]
struct BulkInsertBody<'a> {
    datapoints: &'a [DatapointInsert],
}

impl HttpGateway {
    pub fn builder() -> HttpGatewayBuilder {
        HttpGatewayBuilder::new()
    }

    pub(crate) fn new(transport: HttpTransport, stream_buffer: usize) -> Self {
        Self {
            transport,
            stream_buffer: stream_buffer.max(1),
        }
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub fn stream_buffer(&self) -> usize {
        self.stream_buffer
    }

    async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .transport
            .send(Method::POST, segments, &[], Some(body), false, &[StatusCode::OK])
            .await?;
        HttpTransport::json(response).await
    }
}

/// Run `fut` unless `cancel` fires first.
async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

fn decode_chunk(data: &str) -> Result<InferenceChunk> {
    let value: Value = serde_json::from_str(data)?;
    InferenceChunk::decode(value)
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn inference(
        &self,
        request: &InferenceRequest,
        cancel: CancellationToken,
    ) -> Result<InferenceResponse> {
        if request.stream == Some(true) {
            return Err(Error::validation_with_context(
                "streaming requests must go through inference_stream",
                ErrorContext::new()
                    .with_field_path("stream")
                    .with_source("http_gateway"),
            ));
        }
        cancellable(&cancel, async {
            let value: Value = self.post_json(&["inference"], request).await?;
            InferenceResponse::decode(value)
        })
        .await
    }

    fn inference_stream(
        &self,
        request: &InferenceRequest,
        cancel: CancellationToken,
    ) -> InferenceStream {
        let mut request = request.clone();
        request.stream = Some(true);
        let transport = self.transport.clone();

        let open = async move {
            let response = transport
                .send(
                    Method::POST,
                    &["inference"],
                    &[],
                    Some(&request),
                    true,
                    &[StatusCode::OK],
                )
                .await?;
            tracing::debug!("inference stream connected");
            let chunks = sse::data_stream(HttpTransport::byte_stream(response))
                .map(|item| item.and_then(|data| decode_chunk(&data)));
            Ok::<_, Error>(chunks)
        };

        InferenceStream::spawn_with_capacity(
            stream::once(open).try_flatten(),
            cancel,
            self.stream_buffer,
        )
    }

    async fn feedback(
        &self,
        request: &FeedbackRequest,
        cancel: CancellationToken,
    ) -> Result<FeedbackResponse> {
        cancellable(&cancel, self.post_json(&["feedback"], request)).await
    }

    async fn dynamic_evaluation_run(
        &self,
        request: &DynamicEvaluationRunRequest,
        cancel: CancellationToken,
    ) -> Result<DynamicEvaluationRunResponse> {
        cancellable(&cancel, self.post_json(&["dynamic_evaluation_run"], request)).await
    }

    async fn dynamic_evaluation_run_episode(
        &self,
        request: &DynamicEvaluationRunEpisodeRequest,
        cancel: CancellationToken,
    ) -> Result<DynamicEvaluationRunEpisodeResponse> {
        cancellable(
            &cancel,
            self.post_json(&["dynamic_evaluation_run_episode"], request),
        )
        .await
    }

    async fn bulk_insert_datapoints(
        &self,
        dataset_name: &str,
        datapoints: &[DatapointInsert],
        cancel: CancellationToken,
    ) -> Result<Vec<Uuid>> {
        let body = BulkInsertBody { datapoints };
        let ids: Vec<Uuid> = cancellable(
            &cancel,
            self.post_json(&["datasets", dataset_name, "datapoints", "bulk"], &body),
        )
        .await?;
        tracing::debug!(dataset = dataset_name, inserted = ids.len(), "bulk inserted datapoints");
        Ok(ids)
    }

    async fn delete_datapoint(
        &self,
        dataset_name: &str,
        datapoint_id: Uuid,
        cancel: CancellationToken,
    ) -> Result<()> {
        let id = datapoint_id.to_string();
        cancellable(&cancel, async {
            self.transport
                .send::<()>(
                    Method::DELETE,
                    &["datasets", dataset_name, "datapoints", id.as_str()],
                    &[],
                    None,
                    false,
                    &[StatusCode::OK, StatusCode::NO_CONTENT],
                )
                .await?;
            Ok(())
        })
        .await
    }

    async fn list_datapoints(
        &self,
        request: &ListDatapointsRequest,
        cancel: CancellationToken,
    ) -> Result<Vec<Datapoint>> {
        let query = request.query_pairs();
        cancellable(&cancel, async {
            let response = self
                .transport
                .send::<()>(
                    Method::GET,
                    &["datasets", request.dataset_name.as_str(), "datapoints"],
                    &query,
                    None,
                    false,
                    &[StatusCode::OK],
                )
                .await?;
            HttpTransport::json(response).await
        })
        .await
    }

    async fn list_inferences(
        &self,
        request: &ListInferencesRequest,
        cancel: CancellationToken,
    ) -> Result<Vec<StoredInference>> {
        cancellable(&cancel, self.post_json(&["inferences", "list"], request)).await
    }
}
