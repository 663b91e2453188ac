use futures::future::BoxFuture;
use serde::Serialize;

use crate::error::Result;
use crate::graph::{ArtifactObject, ExecutionSnapshot, ExecutionSource, Graph};
use crate::types::{AgentId, ExecutionId, Team, TokenUsage};

/// Graph store. Fetches the stored graph of an agent, or a frozen
/// execution snapshot for retries.
pub trait GraphStore: Send + Sync + 'static {
    fn fetch_graph(&self, agent_id: &AgentId) -> BoxFuture<'_, Result<Graph>>;

    fn fetch_snapshot(&self, snapshot_ref: &str) -> BoxFuture<'_, Result<ExecutionSnapshot>>;
}

/// File store. Fetches the extracted text payload of an uploaded file.
pub trait FileStore: Send + Sync + 'static {
    fn fetch_text(&self, url: &str) -> BoxFuture<'_, Result<String>>;
}

/// Quota service: team resolution and execution-time availability.
///
/// Consulted once per execution attempt, never cached across calls.
pub trait QuotaService: Send + Sync + 'static {
    /// All teams the agent belongs to. The engine treats zero as "agent not
    /// found" and more than one as a data-integrity violation.
    fn teams_for_agent(&self, agent_id: &AgentId) -> BoxFuture<'_, Result<Vec<Team>>>;

    /// Whether the team has execution time left.
    fn is_time_available(&self, team: &Team) -> BoxFuture<'_, Result<bool>>;
}

/// Metadata attached to a generation span when it is opened.
#[derive(Debug, Clone)]
pub struct SpanMeta {
    pub execution_id: ExecutionId,
    pub name: String,
    /// The `provider:model` selector driving this generation.
    pub model: String,
    pub top_p: Option<f64>,
    pub temperature: Option<f64>,
}

/// Terminal state recorded when a generation span closes.
#[derive(Debug)]
pub enum SpanOutcome {
    Completed {
        output: ArtifactObject,
        usage: TokenUsage,
    },
    Failed {
        message: String,
    },
    /// The subscriber went away before the backend finished.
    Aborted,
}

/// An open generation span. Closing consumes the handle, so a span can only
/// close once.
pub trait SpanHandle: Send {
    fn record_input(&mut self, input: &str);

    fn close(self: Box<Self>, outcome: SpanOutcome);
}

/// Tracing sink. Forwards generation spans to an observability collaborator.
pub trait TracingSink: Send + Sync + 'static {
    fn open_span(&self, meta: SpanMeta) -> Box<dyn SpanHandle>;
}

/// Variables bound when rendering a generation prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PromptBindings {
    pub instruction: String,
    pub requirement: Option<String>,
    pub sources: Vec<ExecutionSource>,
}

/// Prompt renderer. Template syntax is opaque to the engine.
pub trait PromptRenderer: Send + Sync + 'static {
    fn render(&self, template: &str, bindings: &PromptBindings) -> Result<String>;
}
