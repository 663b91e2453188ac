use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use weft_core::error::{EngineError, Result};
use weft_core::graph::{ArtifactObject, PartialArtifact};

/// One value on an execution stream.
#[derive(Debug, Clone)]
pub enum StreamItem {
    /// A replacement-snapshot partial artifact.
    Partial(PartialArtifact),
    /// The terminal artifact. Always the last item of a successful stream;
    /// the stream closes right after it.
    Done(ArtifactObject),
}

/// The subscriber half of one execution.
///
/// Yields zero or more partials, then either `Done` followed by end of
/// stream, or a single error. Dropping the handle cancels the in-flight
/// backend stream.
#[derive(Debug)]
pub struct ExecutionStream {
    rx: mpsc::Receiver<Result<StreamItem>>,
}

impl ExecutionStream {
    /// Create a bounded producer/subscriber pair.
    pub(crate) fn channel(capacity: usize) -> (mpsc::Sender<Result<StreamItem>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }

    /// Drain the stream, collecting partials until a terminal value.
    ///
    /// Ends with the final artifact, the propagated error, or a stream
    /// failure if the producer went away without a terminal value.
    pub async fn collect_final(mut self) -> (Vec<PartialArtifact>, Result<ArtifactObject>) {
        let mut partials = Vec::new();
        while let Some(item) = self.rx.recv().await {
            match item {
                Ok(StreamItem::Partial(partial)) => partials.push(partial),
                Ok(StreamItem::Done(object)) => return (partials, Ok(object)),
                Err(e) => return (partials, Err(e)),
            }
        }
        (
            partials,
            Err(EngineError::BackendStream(
                "stream closed without a terminal artifact".to_string(),
            )),
        )
    }
}

impl Stream for ExecutionStream {
    type Item = Result<StreamItem>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
