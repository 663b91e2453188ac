use std::time::Instant;

use tracing::{debug, error, info, warn};

use weft_core::traits::{SpanHandle, SpanMeta, SpanOutcome, TracingSink};
use weft_core::types::TokenUsage;

/// Tracing sink that writes generation spans as structured log events.
///
/// The default sink when no external observability collaborator is wired in.
pub struct LogSink;

impl TracingSink for LogSink {
    fn open_span(&self, meta: SpanMeta) -> Box<dyn SpanHandle> {
        debug!(
            execution_id = %meta.execution_id,
            name = %meta.name,
            model = %meta.model,
            "generation span opened"
        );
        Box::new(LogSpan {
            meta,
            opened_at: Instant::now(),
            input_chars: 0,
        })
    }
}

struct LogSpan {
    meta: SpanMeta,
    opened_at: Instant,
    input_chars: usize,
}

impl SpanHandle for LogSpan {
    fn record_input(&mut self, input: &str) {
        self.input_chars = input.chars().count();
        debug!(
            execution_id = %self.meta.execution_id,
            input_chars = self.input_chars,
            "generation input recorded"
        );
    }

    fn close(self: Box<Self>, outcome: SpanOutcome) {
        let elapsed_ms = self.opened_at.elapsed().as_millis() as u64;
        match outcome {
            SpanOutcome::Completed { output, usage } => {
                info!(
                    execution_id = %self.meta.execution_id,
                    model = %self.meta.model,
                    elapsed_ms,
                    output_title = %output.title,
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    "generation span completed"
                );
            }
            SpanOutcome::Failed { message } => {
                error!(
                    execution_id = %self.meta.execution_id,
                    model = %self.meta.model,
                    elapsed_ms,
                    error = %message,
                    "generation span failed"
                );
            }
            SpanOutcome::Aborted => {
                warn!(
                    execution_id = %self.meta.execution_id,
                    model = %self.meta.model,
                    elapsed_ms,
                    "generation span aborted by subscriber disconnect"
                );
            }
        }
    }
}

/// Log duration and token counts for one completed generation.
///
/// Accompanies every `Completed` transition so usage bookkeeping downstream
/// has a durable record per node kind.
pub fn measure_tokens(node_kind: &str, usage: &TokenUsage, started_at: Instant) {
    info!(
        node_kind = %node_kind,
        duration_ms = started_at.elapsed().as_millis() as u64,
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        total_tokens = usage.total_tokens,
        "token usage measured"
    );
}
