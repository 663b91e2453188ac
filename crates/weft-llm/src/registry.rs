use std::collections::HashMap;
use std::sync::Arc;

use weft_core::error::{EngineError, Result};

use crate::backend::GenerationBackend;
use crate::dev::DevBackend;

/// Known generation providers.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum ProviderId {
    OpenAi,
    Anthropic,
    Google,
    /// Deterministic offline backend for fault-injection tests.
    Dev,
}

impl ProviderId {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "google" => Ok(Self::Google),
            "dev" => Ok(Self::Dev),
            other => Err(EngineError::UnsupportedProvider(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Dev => "dev",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed `provider:model` selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelector {
    pub provider: ProviderId,
    pub model: String,
}

impl ModelSelector {
    /// Parse a selector such as `anthropic:claude-sonnet-4-5`.
    ///
    /// An unknown provider is a configuration error, never retried.
    pub fn parse(selector: &str) -> Result<Self> {
        let (provider, model) = selector
            .split_once(':')
            .ok_or_else(|| EngineError::InvalidModelSelector(selector.to_string()))?;
        Ok(Self {
            provider: ProviderId::parse(provider)?,
            model: model.to_string(),
        })
    }
}

impl std::fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

/// Maps provider ids to injected generation backends.
///
/// Injected per engine rather than read from process globals, so tests and
/// embedders control exactly which backends exist.
pub struct ProviderRegistry {
    backends: HashMap<ProviderId, Arc<dyn GenerationBackend>>,
}

impl ProviderRegistry {
    /// An empty registry with no backends.
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Register a backend for a provider, replacing any existing one.
    pub fn with_backend(
        mut self,
        provider: ProviderId,
        backend: Arc<dyn GenerationBackend>,
    ) -> Self {
        self.backends.insert(provider, backend);
        self
    }

    /// Look up the backend for a provider.
    pub fn resolve(&self, provider: ProviderId) -> Result<Arc<dyn GenerationBackend>> {
        self.backends
            .get(&provider)
            .cloned()
            .ok_or_else(|| EngineError::UnsupportedProvider(provider.as_str().to_string()))
    }
}

impl Default for ProviderRegistry {
    /// A registry with only the deterministic `dev` backend.
    fn default() -> Self {
        Self::new().with_backend(ProviderId::Dev, Arc::new(DevBackend))
    }
}
