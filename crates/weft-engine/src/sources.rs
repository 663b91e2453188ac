use futures::future::join_all;
use tracing::debug;

use weft_core::error::{EngineError, Result};
use weft_core::graph::{
    Artifact, ExecutionContext, ExecutionSource, FileData, FileStatus, Node, NodeContent,
    NodeHandle,
};
use weft_core::traits::FileStore;

/// Resolve a node's declared source handles into typed execution inputs.
///
/// Handles resolve concurrently, but the output mirrors the declaration
/// order: `join_all` reassembles results positionally before flattening.
/// Unconnected handles and non-contributing upstream kinds are filtered out
/// rather than failing the run.
pub async fn resolve_sources(
    sources: &[NodeHandle],
    context: &ExecutionContext,
    files: &dyn FileStore,
) -> Result<Vec<ExecutionSource>> {
    let resolved = join_all(
        sources
            .iter()
            .map(|handle| resolve_handle(handle, context, files)),
    )
    .await;

    let mut out = Vec::new();
    for contributions in resolved {
        out.extend(contributions?);
    }
    debug!(
        declared = sources.len(),
        resolved = out.len(),
        "sources resolved"
    );
    Ok(out)
}

/// Resolve one handle to zero or more sources (a `files` node flattens into
/// one entry per completed file).
async fn resolve_handle(
    handle: &NodeHandle,
    context: &ExecutionContext,
    files: &dyn FileStore,
) -> Result<Vec<ExecutionSource>> {
    let Some(node) = context.upstream_node(&handle.id) else {
        return Ok(Vec::new());
    };

    match &node.content {
        NodeContent::Text { text } => Ok(vec![ExecutionSource::Text {
            content: text.clone(),
            node_id: node.id.clone(),
        }]),
        NodeContent::File { data } => {
            let data = data
                .as_ref()
                .ok_or_else(|| EngineError::FileDataMissing(node.id.clone()))?;
            match fetch_file(data, node, files).await? {
                Some(source) => Ok(vec![source]),
                None => Ok(Vec::new()),
            }
        }
        NodeContent::Files { data } => {
            let fetched = join_all(data.iter().map(|entry| async {
                let entry = entry
                    .as_ref()
                    .ok_or_else(|| EngineError::FileDataMissing(node.id.clone()))?;
                fetch_file(entry, node, files).await
            }))
            .await;

            let mut out = Vec::new();
            for source in fetched {
                if let Some(source) = source? {
                    out.push(source);
                }
            }
            Ok(out)
        }
        NodeContent::TextGeneration(_) => Ok(generated_source(node, context)
            .into_iter()
            .collect()),
    }
}

/// Fetch one file's text payload, applying the file-state rules:
/// uploading/processing are transient failures for the whole resolution,
/// failed contributes nothing.
async fn fetch_file(
    data: &FileData,
    node: &Node,
    files: &dyn FileStore,
) -> Result<Option<ExecutionSource>> {
    match data.status {
        FileStatus::Uploading => return Err(EngineError::FileUploading(data.name.clone())),
        FileStatus::Processing => return Err(EngineError::FileProcessing(data.name.clone())),
        FileStatus::Failed => return Ok(None),
        FileStatus::Completed => {}
    }
    let content = files.fetch_text(&data.text_data_url).await?;
    Ok(Some(ExecutionSource::File {
        title: data.name.clone(),
        content,
        node_id: node.id.clone(),
    }))
}

/// The artifact a generation node previously produced, as a source.
fn generated_source(node: &Node, context: &ExecutionContext) -> Option<ExecutionSource> {
    match context.find_artifact(&node.id)? {
        Artifact::GeneratedArtifact { object, .. } => Some(ExecutionSource::TextGeneration {
            title: object.title.clone(),
            content: object.content.clone(),
            node_id: node.id.clone(),
        }),
        Artifact::Unknown => None,
    }
}

/// Resolve the optional requirement handle to raw text.
///
/// Only `text` and `textGeneration` upstream kinds contribute; anything else
/// resolves to `None` silently.
pub fn resolve_requirement(
    requirement: Option<&NodeHandle>,
    context: &ExecutionContext,
) -> Option<String> {
    let node = context.upstream_node(&requirement?.id)?;
    match &node.content {
        NodeContent::Text { text } => Some(text.clone()),
        NodeContent::TextGeneration(_) => match context.find_artifact(&node.id)? {
            Artifact::GeneratedArtifact { object, .. } => Some(object.content.clone()),
            Artifact::Unknown => None,
        },
        _ => None,
    }
}
