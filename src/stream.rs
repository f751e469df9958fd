//! Delivery of a streamed inference over two channels: chunks and errors.
//!
//! One background task drains the source and owns both sinks:
//!
//! - chunks are forwarded in source order through a bounded channel, without merging;
//! - at most one error is delivered, and only after the chunk channel has been closed,
//!   so a consumer that reads chunks until the channel ends and then checks for an
//!   error never misses one and never sees a chunk after it;
//! - on normal completion the chunk channel closes and the error channel closes empty;
//! - once cancellation is observed nothing more is sent on either channel and no error
//!   is reported. Cancellation is checked before every read from the source and while
//!   a chunk is waiting for buffer space.
//!
//! Dropping the chunk receiver alone does not stop the task: while the error receiver
//! is alive the source keeps being drained and further chunks are discarded, so the
//! terminal error still arrives. The task stops once both receivers are gone.

use crate::types::response::InferenceChunk;
use crate::{BoxStream, Error, Result};
use futures::{stream, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Chunk channel capacity used when none is configured.
pub const DEFAULT_CHUNK_BUFFER: usize = 10;

/// Consumer handle for one streamed inference.
#[derive(Debug)]
pub struct InferenceStream {
    chunks: mpsc::Receiver<InferenceChunk>,
    error: oneshot::Receiver<Error>,
    cancel: CancellationToken,
}

impl InferenceStream {
    /// Start forwarding `source` on a background task. Returns immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<S>(source: S, cancel: CancellationToken) -> Self
    where
        S: Stream<Item = Result<InferenceChunk>> + Send + 'static,
    {
        Self::spawn_with_capacity(source, cancel, DEFAULT_CHUNK_BUFFER)
    }

    pub fn spawn_with_capacity<S>(source: S, cancel: CancellationToken, capacity: usize) -> Self
    where
        S: Stream<Item = Result<InferenceChunk>> + Send + 'static,
    {
        let (chunk_tx, chunks) = mpsc::channel(capacity.max(1));
        let (error_tx, error) = oneshot::channel();
        tokio::spawn(produce(Box::pin(source), chunk_tx, error_tx, cancel.clone()));
        Self {
            chunks,
            error,
            cancel,
        }
    }

    /// Next chunk, or `None` once the chunk channel has closed.
    pub async fn next_chunk(&mut self) -> Option<InferenceChunk> {
        self.chunks.recv().await
    }

    /// Wait for the terminal status: `Some(error)` if the stream failed, `None` if it
    /// completed or was cancelled.
    ///
    /// Chunks not yet received are discarded, but the source is still drained so a
    /// failure that happens later is reported. Read chunks with [`next_chunk`] until it
    /// returns `None` first if they matter.
    ///
    /// [`next_chunk`]: InferenceStream::next_chunk
    pub async fn error(self) -> Option<Error> {
        let InferenceStream { chunks, error, .. } = self;
        drop(chunks);
        error.await.ok()
    }

    /// Stop the producer. Equivalent to cancelling the token passed to [`spawn`].
    ///
    /// [`spawn`]: InferenceStream::spawn
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The raw channel pair.
    ///
    /// The error receiver stays valid on its own: dropping the chunk receiver does not
    /// stop the producer while the error receiver is alive.
    pub fn into_parts(self) -> (mpsc::Receiver<InferenceChunk>, oneshot::Receiver<Error>) {
        (self.chunks, self.error)
    }

    /// Chunks as `Ok` items, followed by the error (if any) as a final `Err` item.
    pub fn into_stream(self) -> BoxStream<'static, InferenceChunk> {
        let state = (self.chunks, Some(self.error));
        Box::pin(stream::unfold(state, |(mut chunks, error)| async move {
            if let Some(chunk) = chunks.recv().await {
                return Some((Ok(chunk), (chunks, error)));
            }
            match error?.await {
                Ok(e) => Some((Err(e), (chunks, None))),
                Err(_) => None,
            }
        }))
    }
}

async fn produce(
    mut source: BoxStream<'static, InferenceChunk>,
    chunk_tx: mpsc::Sender<InferenceChunk>,
    mut error_tx: oneshot::Sender<Error>,
    cancel: CancellationToken,
) {
    tracing::debug!("inference stream started");
    let mut forwarded: usize = 0;
    let mut discarded: usize = 0;
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(forwarded, "inference stream cancelled");
                return;
            }
            _ = consumer_gone(&chunk_tx, &mut error_tx) => {
                tracing::debug!(forwarded, discarded, "inference stream receivers dropped");
                return;
            }
            item = source.next() => item,
        };

        match next {
            None => {
                tracing::debug!(forwarded, discarded, "inference stream completed");
                return;
            }
            Some(Ok(chunk)) => {
                if chunk_tx.is_closed() {
                    discarded += 1;
                    continue;
                }
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(forwarded, "inference stream cancelled");
                        return;
                    }
                    sent = chunk_tx.send(chunk) => {
                        if sent.is_ok() {
                            forwarded += 1;
                        } else {
                            discarded += 1;
                        }
                    }
                }
            }
            Some(Err(e)) => {
                tracing::warn!(forwarded, discarded, error = %e, "inference stream failed");
                drop(chunk_tx);
                let _ = error_tx.send(e);
                return;
            }
        }
    }
}

/// Resolves once neither the chunk receiver nor the error receiver is alive.
async fn consumer_gone(
    chunk_tx: &mpsc::Sender<InferenceChunk>,
    error_tx: &mut oneshot::Sender<Error>,
) {
    chunk_tx.closed().await;
    error_tx.closed().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::chunk::ContentBlockChunk;
    use crate::types::response::ChatChunk;
    use uuid::Uuid;

    fn chunk(text: &str) -> InferenceChunk {
        InferenceChunk::Chat(ChatChunk {
            inference_id: Uuid::nil(),
            episode_id: Uuid::nil(),
            variant_name: "v".into(),
            content: vec![ContentBlockChunk::text("0", text)],
            usage: None,
            finish_reason: None,
        })
    }

    #[tokio::test]
    async fn chunks_then_error() {
        let source = stream::iter(vec![
            Ok(chunk("a")),
            Ok(chunk("b")),
            Err(Error::internal("boom")),
            Ok(chunk("never")),
        ]);
        let mut s = InferenceStream::spawn(source, CancellationToken::new());
        assert_eq!(s.next_chunk().await, Some(chunk("a")));
        assert_eq!(s.next_chunk().await, Some(chunk("b")));
        assert_eq!(s.next_chunk().await, None);
        assert!(matches!(s.error().await, Some(Error::Internal { .. })));
    }

    #[tokio::test]
    async fn completion_reports_no_error() {
        let source = stream::iter(vec![Ok(chunk("only"))]);
        let items: Vec<_> = InferenceStream::spawn(source, CancellationToken::new())
            .into_stream()
            .collect()
            .await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_ok());
    }

    #[tokio::test]
    async fn cancelled_before_start_sends_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut s = InferenceStream::spawn(stream::iter(vec![Ok(chunk("a"))]), cancel);
        assert_eq!(s.next_chunk().await, None);
        assert!(s.error().await.is_none());
    }
}
