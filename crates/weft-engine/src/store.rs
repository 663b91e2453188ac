use std::collections::HashMap;

use futures::future::BoxFuture;
use reqwest::Client;
use tracing::debug;

use weft_core::error::{EngineError, Result};
use weft_core::graph::{ExecutionSnapshot, Graph};
use weft_core::traits::{FileStore, GraphStore};
use weft_core::types::AgentId;

/// Graph store backed by HTTP blob storage.
///
/// Graph JSON and execution snapshots live at URLs; the agent-to-URL mapping
/// is supplied by the embedder (it owns agent persistence).
pub struct HttpGraphStore {
    http: Client,
    graph_urls: HashMap<AgentId, String>,
}

impl HttpGraphStore {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            graph_urls: HashMap::new(),
        }
    }

    /// Register the graph URL for an agent.
    pub fn with_agent_graph(mut self, agent_id: AgentId, url: impl Into<String>) -> Self {
        self.graph_urls.insert(agent_id, url.into());
        self
    }
}

impl Default for HttpGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore for HttpGraphStore {
    fn fetch_graph(&self, agent_id: &AgentId) -> BoxFuture<'_, Result<Graph>> {
        let agent_id = agent_id.clone();
        Box::pin(async move {
            let url = self
                .graph_urls
                .get(&agent_id)
                .ok_or_else(|| EngineError::AgentNotFound(agent_id.clone()))?;
            debug!(agent_id = %agent_id, url = %url, "fetching graph");
            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| EngineError::Store(e.to_string()))?;
            // A missing graph blob means the agent does not exist.
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(EngineError::AgentNotFound(agent_id));
            }
            response
                .error_for_status()
                .map_err(|e| EngineError::Store(e.to_string()))?
                .json::<Graph>()
                .await
                .map_err(|e| EngineError::Store(e.to_string()))
        })
    }

    fn fetch_snapshot(&self, snapshot_ref: &str) -> BoxFuture<'_, Result<ExecutionSnapshot>> {
        let snapshot_ref = snapshot_ref.to_string();
        Box::pin(async move {
            debug!(snapshot = %snapshot_ref, "fetching execution snapshot");
            let response = self
                .http
                .get(&snapshot_ref)
                .send()
                .await
                .map_err(|e| EngineError::Store(e.to_string()))?;
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(EngineError::SnapshotNotFound(snapshot_ref));
            }
            response
                .error_for_status()
                .map_err(|e| EngineError::Store(e.to_string()))?
                .json::<ExecutionSnapshot>()
                .await
                .map_err(|e| EngineError::Store(e.to_string()))
        })
    }
}

/// File store fetching extracted text payloads over HTTP.
pub struct HttpFileStore {
    http: Client,
}

impl HttpFileStore {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }
}

impl Default for HttpFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStore for HttpFileStore {
    fn fetch_text(&self, url: &str) -> BoxFuture<'_, Result<String>> {
        let url = url.to_string();
        Box::pin(async move {
            self.http
                .get(&url)
                .send()
                .await
                .map_err(|e| EngineError::Store(e.to_string()))?
                .error_for_status()
                .map_err(|e| EngineError::Store(e.to_string()))?
                .text()
                .await
                .map_err(|e| EngineError::Store(e.to_string()))
        })
    }
}

/// In-memory graph store for tests and embedded use.
#[derive(Default)]
pub struct InMemoryGraphStore {
    graphs: HashMap<AgentId, Graph>,
    snapshots: HashMap<String, ExecutionSnapshot>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_graph(mut self, agent_id: AgentId, graph: Graph) -> Self {
        self.graphs.insert(agent_id, graph);
        self
    }

    pub fn with_snapshot(mut self, reference: impl Into<String>, snapshot: ExecutionSnapshot) -> Self {
        self.snapshots.insert(reference.into(), snapshot);
        self
    }
}

impl GraphStore for InMemoryGraphStore {
    fn fetch_graph(&self, agent_id: &AgentId) -> BoxFuture<'_, Result<Graph>> {
        let agent_id = agent_id.clone();
        Box::pin(async move {
            self.graphs
                .get(&agent_id)
                .cloned()
                .ok_or(EngineError::AgentNotFound(agent_id))
        })
    }

    fn fetch_snapshot(&self, snapshot_ref: &str) -> BoxFuture<'_, Result<ExecutionSnapshot>> {
        let snapshot_ref = snapshot_ref.to_string();
        Box::pin(async move {
            self.snapshots
                .get(&snapshot_ref)
                .cloned()
                .ok_or(EngineError::SnapshotNotFound(snapshot_ref))
        })
    }
}

/// In-memory file store for tests.
#[derive(Default)]
pub struct InMemoryFileStore {
    texts: HashMap<String, String>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.texts.insert(url.into(), text.into());
        self
    }
}

impl FileStore for InMemoryFileStore {
    fn fetch_text(&self, url: &str) -> BoxFuture<'_, Result<String>> {
        let url = url.to_string();
        Box::pin(async move {
            self.texts
                .get(&url)
                .cloned()
                .ok_or_else(|| EngineError::Store(format!("no text payload at {url}")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Serve exactly one HTTP response on an ephemeral local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let response = format!(
                "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_http_graph_store_missing_blob_is_agent_not_found() {
        let url = serve_once("HTTP/1.1 404 Not Found", "").await;
        let agent_id = AgentId::from_str("agnt_gone");
        let store = HttpGraphStore::new().with_agent_graph(agent_id.clone(), url);

        let err = store.fetch_graph(&agent_id).await.unwrap_err();
        assert!(matches!(err, EngineError::AgentNotFound(id) if id == agent_id));
    }

    #[tokio::test]
    async fn test_http_graph_store_missing_snapshot() {
        let url = serve_once("HTTP/1.1 404 Not Found", "").await;
        let store = HttpGraphStore::new();

        let err = store.fetch_snapshot(&url).await.unwrap_err();
        assert!(matches!(err, EngineError::SnapshotNotFound(_)));
    }

    #[tokio::test]
    async fn test_http_graph_store_server_error_is_store_error() {
        let url = serve_once("HTTP/1.1 500 Internal Server Error", "").await;
        let agent_id = AgentId::from_str("agnt_x");
        let store = HttpGraphStore::new().with_agent_graph(agent_id.clone(), url);

        let err = store.fetch_graph(&agent_id).await.unwrap_err();
        assert!(matches!(err, EngineError::Store(_)));
    }

    #[tokio::test]
    async fn test_in_memory_graph_store_missing_agent() {
        let store = InMemoryGraphStore::new();
        let err = store.fetch_graph(&AgentId::from_str("agnt_x")).await.unwrap_err();
        assert!(matches!(err, EngineError::AgentNotFound(_)));
    }

    #[tokio::test]
    async fn test_in_memory_snapshot_roundtrip() {
        let snapshot = ExecutionSnapshot {
            flow: weft_core::graph::Flow {
                id: weft_core::types::FlowId::from_str("flw_1"),
                name: "f".into(),
                jobs: vec![],
            },
            nodes: vec![],
            connections: vec![],
        };
        let store = InMemoryGraphStore::new().with_snapshot("snap-1", snapshot);
        assert!(store.fetch_snapshot("snap-1").await.is_ok());
        assert!(matches!(
            store.fetch_snapshot("snap-2").await.unwrap_err(),
            EngineError::SnapshotNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_in_memory_file_store() {
        let store = InMemoryFileStore::new().with_text("file://a", "hello");
        assert_eq!(store.fetch_text("file://a").await.unwrap(), "hello");
        assert!(store.fetch_text("file://b").await.is_err());
    }
}
