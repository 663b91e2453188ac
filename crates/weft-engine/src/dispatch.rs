use std::time::Instant;

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use weft_core::error::{EngineError, Result};
use weft_core::graph::{ArtifactMessages, ExecutionContext, NodeContent, PartialArtifact};
use weft_core::traits::{PromptBindings, SpanHandle, SpanMeta, SpanOutcome};
use weft_core::types::ExecutionId;
use weft_llm::{artifact_schema, GenerationChunk, GenerationRequest, GenerationStream, ModelSelector, PartialObject};

use crate::engine::Engine;
use crate::quota::ensure_time_available;
use crate::sources::{resolve_requirement, resolve_sources};
use crate::stream::{ExecutionStream, StreamItem};
use crate::trace::measure_tokens;

impl Engine {
    /// Run one execution context through the generation state machine:
    /// `Idle → Authorized → Prompting → Streaming → Completed | Failed`.
    ///
    /// Everything up to the backend call happens before this returns, so
    /// quota, resolution, and provider errors surface as `Err` here. Once
    /// the stream is open, failures travel through the returned stream.
    pub(crate) async fn dispatch(&self, context: ExecutionContext) -> Result<ExecutionStream> {
        // Idle → Authorized. On failure the run never reaches the backend
        // and no span is opened.
        let team = ensure_time_available(self.quota.as_ref(), &context.agent_id).await?;
        debug!(
            execution_id = %context.execution_id,
            team = %team.id,
            node_id = %context.node.id,
            "execution authorized"
        );

        let generation = match &context.node.content {
            NodeContent::TextGeneration(content) => content.clone(),
            other => {
                return Err(EngineError::UnsupportedNodeContent(other.kind().to_string()))
            }
        };
        let node_kind = context.node.content.kind();

        // Authorized → Prompting
        let sources = resolve_sources(&generation.sources, &context, self.files.as_ref()).await?;
        let requirement = resolve_requirement(generation.requirement.as_ref(), &context);
        let selector = ModelSelector::parse(&generation.llm)?;
        let backend = self.registry.resolve(selector.provider)?;

        let template = generation
            .system
            .as_deref()
            .unwrap_or(crate::prompt::TEXT_GENERATION_TEMPLATE);
        let prompt = self.renderer.render(
            template,
            &PromptBindings {
                instruction: generation.instruction.clone(),
                requirement,
                sources,
            },
        )?;

        let mut span = self.sink.open_span(SpanMeta {
            execution_id: context.execution_id.clone(),
            name: "generate-text".to_string(),
            model: generation.llm.clone(),
            top_p: generation.top_p,
            temperature: generation.temperature,
        });
        span.record_input(&prompt);

        // Prompting → Streaming
        let started_at = Instant::now();
        let request = GenerationRequest {
            model: selector.model,
            prompt,
            schema: artifact_schema(),
            top_p: generation.top_p,
            temperature: generation.temperature,
        };
        let backend_stream = match backend.stream_structured(request).await {
            Ok(stream) => stream,
            Err(e) => {
                span.close(SpanOutcome::Failed {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        let (tx, stream) = ExecutionStream::channel(self.channel_capacity);
        tokio::spawn(relay_stream(
            backend_stream,
            tx,
            span,
            context.execution_id,
            node_kind,
            started_at,
        ));
        Ok(stream)
    }
}

/// Consume the backend stream, relaying values to the subscriber.
///
/// Terminal transitions close the span exactly once: `Completed` after the
/// final object, `Failed` on any backend error, `Aborted` when the
/// subscriber goes away mid-stream.
async fn relay_stream(
    mut backend: GenerationStream,
    tx: mpsc::Sender<Result<StreamItem>>,
    span: Box<dyn SpanHandle>,
    execution_id: ExecutionId,
    node_kind: &'static str,
    started_at: Instant,
) {
    loop {
        let chunk = tokio::select! {
            // Subscriber disconnect cancels the in-flight backend stream.
            _ = tx.closed() => {
                abort_on_disconnect(span, &execution_id);
                return;
            }
            chunk = backend.next() => chunk,
        };

        match chunk {
            Some(Ok(GenerationChunk::Partial(partial))) => {
                let item = StreamItem::Partial(partial_artifact(partial));
                if tx.send(Ok(item)).await.is_err() {
                    abort_on_disconnect(span, &execution_id);
                    return;
                }
            }
            Some(Ok(GenerationChunk::Finish { object, usage })) => {
                // Streaming → Completed
                measure_tokens(node_kind, &usage, started_at);
                span.close(SpanOutcome::Completed {
                    output: object.clone(),
                    usage,
                });
                let _ = tx.send(Ok(StreamItem::Done(object))).await;
                return;
            }
            Some(Err(e)) => {
                // Streaming → Failed
                error!(execution_id = %execution_id, error = %e, "generation stream failed");
                span.close(SpanOutcome::Failed {
                    message: e.to_string(),
                });
                let _ = tx.send(Err(e)).await;
                return;
            }
            None => {
                // The backend closed without a final object.
                let message = "backend stream ended without a final object".to_string();
                error!(execution_id = %execution_id, "{message}");
                span.close(SpanOutcome::Failed {
                    message: message.clone(),
                });
                let _ = tx.send(Err(EngineError::BackendStream(message))).await;
                return;
            }
        }
    }
}

/// The single abort transition: the subscriber went away, so the span closes
/// aborted and the backend stream is dropped.
fn abort_on_disconnect(span: Box<dyn SpanHandle>, execution_id: &ExecutionId) {
    warn!(execution_id = %execution_id, "subscriber disconnected, aborting generation");
    span.close(SpanOutcome::Aborted);
}

/// Map a streamed partial object to the replacement-snapshot artifact pushed
/// to subscribers. Absent fields render as empty strings.
fn partial_artifact(partial: PartialObject) -> PartialArtifact {
    PartialArtifact {
        title: partial.title.unwrap_or_default(),
        content: partial.content.unwrap_or_default(),
        messages: ArtifactMessages {
            plan: partial.plan.unwrap_or_default(),
            description: partial.description.unwrap_or_default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_artifact_fills_missing_fields() {
        let artifact = partial_artifact(PartialObject {
            plan: Some("outline".into()),
            title: None,
            content: Some("body".into()),
            description: None,
        });
        assert_eq!(artifact.title, "");
        assert_eq!(artifact.content, "body");
        assert_eq!(artifact.messages.plan, "outline");
        assert_eq!(artifact.messages.description, "");
    }
}
