use std::sync::Arc;

use tracing::info;

use weft_core::error::{EngineError, Result};
use weft_core::graph::{Artifact, ExecutionContext};
use weft_core::traits::{FileStore, GraphStore, PromptRenderer, QuotaService, TracingSink};
use weft_core::types::{AgentId, ExecutionId, FlowId, NodeId, StepId};
use weft_llm::ProviderRegistry;

use crate::prompt::TemplateRenderer;
use crate::stream::ExecutionStream;
use crate::trace::LogSink;

const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// The execution engine.
///
/// Holds the injected collaborators and exposes the three execution entry
/// points. All of them build an `ExecutionContext` and converge on the one
/// dispatcher, so a fresh run and a snapshot retry share identical
/// semantics once the context exists.
pub struct Engine {
    pub(crate) graphs: Arc<dyn GraphStore>,
    pub(crate) files: Arc<dyn FileStore>,
    pub(crate) quota: Arc<dyn QuotaService>,
    pub(crate) sink: Arc<dyn TracingSink>,
    pub(crate) renderer: Arc<dyn PromptRenderer>,
    pub(crate) registry: Arc<ProviderRegistry>,
    pub(crate) channel_capacity: usize,
}

impl Engine {
    /// Create an engine over the required stores, with the default tracing
    /// sink, renderer, and a registry carrying only the `dev` backend.
    pub fn new(
        graphs: Arc<dyn GraphStore>,
        files: Arc<dyn FileStore>,
        quota: Arc<dyn QuotaService>,
    ) -> Self {
        Self {
            graphs,
            files,
            quota,
            sink: Arc::new(LogSink),
            renderer: Arc::new(TemplateRenderer),
            registry: Arc::new(ProviderRegistry::default()),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_tracing_sink(mut self, sink: Arc<dyn TracingSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn PromptRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Execute one step of a flow against the agent's live graph.
    pub async fn execute_by_step(
        &self,
        agent_id: &AgentId,
        flow_id: &FlowId,
        execution_id: ExecutionId,
        step_id: &StepId,
        artifacts: Vec<Artifact>,
    ) -> Result<ExecutionStream> {
        info!(
            agent_id = %agent_id,
            flow_id = %flow_id,
            execution_id = %execution_id,
            step_id = %step_id,
            "executing step"
        );
        let graph = self.graphs.fetch_graph(agent_id).await?;
        let flow = graph
            .find_flow(flow_id)
            .ok_or_else(|| EngineError::FlowNotFound(flow_id.clone()))?;
        let step = flow
            .find_step(step_id)
            .ok_or_else(|| EngineError::StepNotFound(step_id.clone()))?;
        let node = graph
            .find_node(&step.node_id)
            .ok_or_else(|| EngineError::NodeNotFound(step.node_id.clone()))?
            .clone();

        let context = ExecutionContext {
            agent_id: agent_id.clone(),
            execution_id,
            node,
            artifacts,
            nodes: graph.nodes,
            connections: graph.connections,
        };
        self.dispatch(context).await
    }

    /// Execute a single node directly, using the live graph's own artifacts.
    pub async fn execute_by_node(
        &self,
        agent_id: &AgentId,
        execution_id: ExecutionId,
        node_id: &NodeId,
    ) -> Result<ExecutionStream> {
        info!(
            agent_id = %agent_id,
            execution_id = %execution_id,
            node_id = %node_id,
            "executing node"
        );
        let graph = self.graphs.fetch_graph(agent_id).await?;
        let node = graph
            .find_node(node_id)
            .ok_or_else(|| EngineError::NodeNotFound(node_id.clone()))?
            .clone();

        let context = ExecutionContext {
            agent_id: agent_id.clone(),
            execution_id,
            node,
            artifacts: graph.artifacts,
            nodes: graph.nodes,
            connections: graph.connections,
        };
        self.dispatch(context).await
    }

    /// Retry one step against a frozen execution snapshot.
    ///
    /// The snapshot insulates the retry from concurrent edits to the live
    /// graph: it replays against exactly the topology of the original
    /// attempt.
    pub async fn retry_step(
        &self,
        agent_id: &AgentId,
        snapshot_ref: &str,
        execution_id: ExecutionId,
        step_id: &StepId,
        artifacts: Vec<Artifact>,
    ) -> Result<ExecutionStream> {
        info!(
            agent_id = %agent_id,
            snapshot = %snapshot_ref,
            execution_id = %execution_id,
            step_id = %step_id,
            "retrying step from snapshot"
        );
        let snapshot = self.graphs.fetch_snapshot(snapshot_ref).await?;
        let step = snapshot
            .flow
            .find_step(step_id)
            .ok_or_else(|| EngineError::StepNotFound(step_id.clone()))?;
        let node = snapshot
            .nodes
            .iter()
            .find(|node| node.id == step.node_id)
            .ok_or_else(|| EngineError::NodeNotFound(step.node_id.clone()))?
            .clone();

        let context = ExecutionContext {
            agent_id: agent_id.clone(),
            execution_id,
            node,
            artifacts,
            nodes: snapshot.nodes,
            connections: snapshot.connections,
        };
        self.dispatch(context).await
    }
}
