use thiserror::Error;

use crate::types::{AgentId, FlowId, NodeId, StepId};

#[derive(Debug, Error)]
pub enum EngineError {
    // Lookup failures: fatal for the current call, never retried internally
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("flow {0} not found")]
    FlowNotFound(FlowId),

    #[error("step {0} not found")]
    StepNotFound(StepId),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("execution snapshot {0} not found")]
    SnapshotNotFound(String),

    // Upstream invariant violations, surfaced distinctly for alerting
    #[error("agent {0} is in multiple teams")]
    AgentInMultipleTeams(AgentId),

    // Quota
    #[error("agent time is not available for this team")]
    AgentTimeNotAvailable,

    // Source resolution
    #[error("file data missing on node {0}")]
    FileDataMissing(NodeId),

    #[error("file {0} is uploading")]
    FileUploading(String),

    #[error("file {0} is processing")]
    FileProcessing(String),

    // Model selection
    #[error("unsupported model provider: {0}")]
    UnsupportedProvider(String),

    #[error("invalid model selector: {0}")]
    InvalidModelSelector(String),

    #[error("node content kind cannot be executed: {0}")]
    UnsupportedNodeContent(String),

    // Generation backend
    #[error("generation stream failed: {0}")]
    BackendStream(String),

    // Prompt rendering
    #[error("template error: {0}")]
    Template(String),

    // External stores
    #[error("store error: {0}")]
    Store(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Transient input conditions: the caller should re-queue the execution
    /// later instead of treating the run as permanently failed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::FileUploading(_) | Self::FileProcessing(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
