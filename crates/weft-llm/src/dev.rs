use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use tracing::debug;

use weft_core::error::{EngineError, Result};

use crate::backend::{GenerationBackend, GenerationRequest, GenerationStream};

/// Deterministic offline backend for the `dev` provider.
///
/// Yields exactly one error chunk and nothing else, so failure paths through
/// the dispatcher can be exercised without any network access.
pub struct DevBackend;

impl GenerationBackend for DevBackend {
    fn stream_structured(
        &self,
        request: GenerationRequest,
    ) -> BoxFuture<'_, Result<GenerationStream>> {
        Box::pin(async move {
            debug!(model = %request.model, "dev backend opening simulated stream");
            let chunks = vec![Err(EngineError::BackendStream(
                "dev provider simulated failure".to_string(),
            ))];
            Ok(stream::iter(chunks).boxed())
        })
    }
}
