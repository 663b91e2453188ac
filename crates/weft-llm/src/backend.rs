use futures::future::BoxFuture;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use weft_core::error::Result;
use weft_core::graph::ArtifactObject;
use weft_core::types::TokenUsage;

/// A structured-output streaming generation request.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    /// Model identifier within the provider, e.g. `gpt-4o`.
    pub model: String,
    pub prompt: String,
    /// JSON schema the backend must conform its output to.
    pub schema: serde_json::Value,
    pub top_p: Option<f64>,
    pub temperature: Option<f64>,
}

/// A partially resolved output object. Fields fill in as the backend streams.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialObject {
    pub plan: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
}

/// One chunk of a structured generation stream.
#[derive(Debug, Clone)]
pub enum GenerationChunk {
    /// A partial object snapshot. Supersedes every previous partial.
    Partial(PartialObject),
    /// The final resolved object plus token usage. Always the last chunk of
    /// a successful stream.
    Finish {
        object: ArtifactObject,
        usage: TokenUsage,
    },
}

pub type GenerationStream = BoxStream<'static, Result<GenerationChunk>>;

/// Generation backend, one per provider, injected through the registry so
/// tests can substitute doubles.
pub trait GenerationBackend: Send + Sync + 'static {
    fn stream_structured(
        &self,
        request: GenerationRequest,
    ) -> BoxFuture<'_, Result<GenerationStream>>;
}

impl std::fmt::Debug for dyn GenerationBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn GenerationBackend")
    }
}
