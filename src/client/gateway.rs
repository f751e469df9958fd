use crate::filter::{ListInferencesRequest, StoredInference};
use crate::stream::InferenceStream;
use crate::types::{
    Datapoint, DatapointInsert, DynamicEvaluationRunEpisodeRequest,
    DynamicEvaluationRunEpisodeResponse, DynamicEvaluationRunRequest,
    DynamicEvaluationRunResponse, FeedbackRequest, FeedbackResponse, InferenceRequest,
    InferenceResponse, ListDatapointsRequest,
};
use crate::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Operations offered by a TensorZero gateway.
///
/// Every call takes a cancellation token. A non-streaming call that is cancelled
/// returns [`Error::Cancelled`](crate::Error::Cancelled); a cancelled stream simply
/// ends, with no error reported.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn inference(
        &self,
        request: &InferenceRequest,
        cancel: CancellationToken,
    ) -> Result<InferenceResponse>;

    /// Start a streamed inference. Connection and status failures are reported on the
    /// returned stream's error channel, not here.
    fn inference_stream(
        &self,
        request: &InferenceRequest,
        cancel: CancellationToken,
    ) -> InferenceStream;

    async fn feedback(
        &self,
        request: &FeedbackRequest,
        cancel: CancellationToken,
    ) -> Result<FeedbackResponse>;

    async fn dynamic_evaluation_run(
        &self,
        request: &DynamicEvaluationRunRequest,
        cancel: CancellationToken,
    ) -> Result<DynamicEvaluationRunResponse>;

    async fn dynamic_evaluation_run_episode(
        &self,
        request: &DynamicEvaluationRunEpisodeRequest,
        cancel: CancellationToken,
    ) -> Result<DynamicEvaluationRunEpisodeResponse>;

    /// Insert datapoints into `dataset_name`, returning their ids in input order.
    async fn bulk_insert_datapoints(
        &self,
        dataset_name: &str,
        datapoints: &[DatapointInsert],
        cancel: CancellationToken,
    ) -> Result<Vec<Uuid>>;

    async fn delete_datapoint(
        &self,
        dataset_name: &str,
        datapoint_id: Uuid,
        cancel: CancellationToken,
    ) -> Result<()>;

    async fn list_datapoints(
        &self,
        request: &ListDatapointsRequest,
        cancel: CancellationToken,
    ) -> Result<Vec<Datapoint>>;

    async fn list_inferences(
        &self,
        request: &ListInferencesRequest,
        cancel: CancellationToken,
    ) -> Result<Vec<StoredInference>>;
}
