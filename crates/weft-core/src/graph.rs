use serde::{Deserialize, Serialize};

use crate::types::{AgentId, ExecutionId, FlowId, NodeHandleId, NodeId, StepId};

/// A unit of work or data in the workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    pub content: NodeContent,
}

/// Closed tagged union of node content kinds.
///
/// The tag values match the graph JSON written by the designer, so graphs
/// and snapshots deserialize without translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeContent {
    Text {
        text: String,
    },
    File {
        #[serde(default)]
        data: Option<FileData>,
    },
    Files {
        #[serde(default)]
        data: Vec<Option<FileData>>,
    },
    TextGeneration(TextGenerationContent),
}

impl NodeContent {
    /// Stable name of this content kind, used in logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::File { .. } => "file",
            Self::Files { .. } => "files",
            Self::TextGeneration(_) => "textGeneration",
        }
    }
}

/// Configuration of a text-generation node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextGenerationContent {
    /// Model selector in `provider:model` form, e.g. `anthropic:claude-sonnet-4-5`.
    pub llm: String,
    /// The user's instruction for this node.
    pub instruction: String,
    /// Optional system template override. When absent the engine's default
    /// text-generation template is used.
    #[serde(default)]
    pub system: Option<String>,
    /// Input handles, in declaration order. Resolution output mirrors this
    /// order.
    #[serde(default)]
    pub sources: Vec<NodeHandle>,
    /// Optional single requirement handle.
    #[serde(default)]
    pub requirement: Option<NodeHandle>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// Lifecycle state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Uploading,
    Processing,
    Completed,
    Failed,
}

/// An uploaded file referenced by a `file`/`files` node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub name: String,
    pub status: FileStatus,
    /// Where the extracted text payload lives. Fetched through the
    /// `FileStore` capability at resolution time.
    #[serde(default)]
    pub text_data_url: String,
}

/// A named input or output slot on a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeHandle {
    pub id: NodeHandleId,
    pub node_id: NodeId,
    #[serde(default)]
    pub label: String,
}

/// Directed edge: a node's output feeding another node's input handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
    pub target_node_handle_id: NodeHandleId,
}

/// One step of a flow job, pointing at the node it executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: StepId,
    pub node_id: NodeId,
}

/// A group of steps scheduled together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// An executable flow within a graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    pub id: FlowId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

impl Flow {
    /// Find a step by id across all jobs of this flow.
    pub fn find_step(&self, step_id: &StepId) -> Option<&Step> {
        self.jobs
            .iter()
            .flat_map(|job| job.steps.iter())
            .find(|step| &step.id == step_id)
    }
}

/// The final object produced by a generation node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactObject {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub description: String,
}

/// Result of a prior node execution, keyed by the node that created it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Artifact {
    #[serde(rename_all = "camelCase")]
    GeneratedArtifact {
        id: String,
        creator_node_id: NodeId,
        object: ArtifactObject,
    },
    /// Forward-compatibility escape hatch: artifact kinds this engine does
    /// not know about deserialize here and contribute nothing.
    #[serde(other)]
    Unknown,
}

impl Artifact {
    pub fn creator_node_id(&self) -> Option<&NodeId> {
        match self {
            Self::GeneratedArtifact {
                creator_node_id, ..
            } => Some(creator_node_id),
            Self::Unknown => None,
        }
    }
}

/// In-progress messages attached to a partial artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMessages {
    pub plan: String,
    pub description: String,
}

/// A replacement-snapshot value pushed to subscribers while streaming.
///
/// Each push supersedes the previous one entirely; consumers render the
/// latest value, they do not accumulate deltas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialArtifact {
    pub title: String,
    pub content: String,
    pub messages: ArtifactMessages,
}

/// The unit fetched per execution: an immutable snapshot of topology plus
/// previously generated artifacts. Never mutated by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub flows: Vec<Flow>,
}

impl Graph {
    pub fn find_node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| &node.id == node_id)
    }

    pub fn find_flow(&self, flow_id: &FlowId) -> Option<&Flow> {
        self.flows.iter().find(|flow| &flow.id == flow_id)
    }
}

/// A frozen copy of `{nodes, connections, flow}` taken when an execution was
/// first attempted. Retries replay against this, insulated from concurrent
/// edits to the live graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSnapshot {
    pub flow: Flow,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// A resolved, typed input ready for prompting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExecutionSource {
    #[serde(rename_all = "camelCase")]
    Text { content: String, node_id: NodeId },
    #[serde(rename_all = "camelCase")]
    File {
        title: String,
        content: String,
        node_id: NodeId,
    },
    #[serde(rename_all = "camelCase")]
    TextGeneration {
        title: String,
        content: String,
        node_id: NodeId,
    },
}

/// Per-run execution state: the target node plus the topology and artifacts
/// it resolves against. Built once per execution or retry, never persisted.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub agent_id: AgentId,
    pub execution_id: ExecutionId,
    /// The node being executed. Must be present in `nodes`.
    pub node: Node,
    pub artifacts: Vec<Artifact>,
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
}

impl ExecutionContext {
    pub fn find_node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| &node.id == node_id)
    }

    /// Find the connection feeding a target handle.
    ///
    /// The data model expects at most one connection per target handle; if
    /// several exist the first match wins.
    pub fn find_connection_to(&self, handle_id: &NodeHandleId) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|connection| &connection.target_node_handle_id == handle_id)
    }

    /// Resolve the node upstream of an input handle, or `None` if nothing is
    /// connected. A dangling connection (source node no longer in the graph)
    /// also resolves to `None` rather than failing.
    pub fn upstream_node(&self, handle_id: &NodeHandleId) -> Option<&Node> {
        let connection = self.find_connection_to(handle_id)?;
        self.find_node(&connection.source_node_id)
    }

    /// Find the generated artifact created by a node, if any.
    pub fn find_artifact(&self, creator_node_id: &NodeId) -> Option<&Artifact> {
        self.artifacts
            .iter()
            .find(|artifact| artifact.creator_node_id() == Some(creator_node_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_node(id: &str, text: &str) -> Node {
        Node {
            id: NodeId::from_str(id),
            name: format!("node {id}"),
            content: NodeContent::Text { text: text.into() },
        }
    }

    fn context(nodes: Vec<Node>, connections: Vec<Connection>, artifacts: Vec<Artifact>) -> ExecutionContext {
        let node = nodes[0].clone();
        ExecutionContext {
            agent_id: AgentId::new(),
            execution_id: ExecutionId::new(),
            node,
            artifacts,
            nodes,
            connections,
        }
    }

    #[test]
    fn test_upstream_node_follows_connection() {
        let handle = NodeHandleId::from_str("ndh_in");
        let nodes = vec![text_node("nd_a", "hello"), text_node("nd_b", "world")];
        let connections = vec![Connection {
            id: "cnnc_1".into(),
            source_node_id: NodeId::from_str("nd_b"),
            target_node_id: NodeId::from_str("nd_a"),
            target_node_handle_id: handle.clone(),
        }];
        let ctx = context(nodes, connections, vec![]);

        let upstream = ctx.upstream_node(&handle).unwrap();
        assert_eq!(upstream.id, NodeId::from_str("nd_b"));
    }

    #[test]
    fn test_upstream_node_absent_when_unconnected() {
        let ctx = context(vec![text_node("nd_a", "hello")], vec![], vec![]);
        assert!(ctx.upstream_node(&NodeHandleId::from_str("ndh_x")).is_none());
    }

    #[test]
    fn test_upstream_node_dangling_source_is_absent() {
        let handle = NodeHandleId::from_str("ndh_in");
        let connections = vec![Connection {
            id: "cnnc_1".into(),
            source_node_id: NodeId::from_str("nd_gone"),
            target_node_id: NodeId::from_str("nd_a"),
            target_node_handle_id: handle.clone(),
        }];
        let ctx = context(vec![text_node("nd_a", "hello")], connections, vec![]);
        assert!(ctx.upstream_node(&handle).is_none());
    }

    #[test]
    fn test_first_matching_connection_wins() {
        let handle = NodeHandleId::from_str("ndh_in");
        let mk = |id: &str, source: &str| Connection {
            id: id.into(),
            source_node_id: NodeId::from_str(source),
            target_node_id: NodeId::from_str("nd_a"),
            target_node_handle_id: handle.clone(),
        };
        let ctx = context(
            vec![text_node("nd_a", "a"), text_node("nd_b", "b"), text_node("nd_c", "c")],
            vec![mk("cnnc_1", "nd_b"), mk("cnnc_2", "nd_c")],
            vec![],
        );
        assert_eq!(
            ctx.upstream_node(&handle).unwrap().id,
            NodeId::from_str("nd_b")
        );
    }

    #[test]
    fn test_find_artifact_by_creator() {
        let creator = NodeId::from_str("nd_gen");
        let artifact = Artifact::GeneratedArtifact {
            id: "artf_1".into(),
            creator_node_id: creator.clone(),
            object: ArtifactObject {
                title: "T".into(),
                content: "C".into(),
                ..Default::default()
            },
        };
        let ctx = context(vec![text_node("nd_a", "x")], vec![], vec![artifact]);
        assert!(ctx.find_artifact(&creator).is_some());
        assert!(ctx.find_artifact(&NodeId::from_str("nd_other")).is_none());
    }

    #[test]
    fn test_node_content_json_tags() {
        let json = r#"{"type":"textGeneration","llm":"openai:gpt-4o","instruction":"write","sources":[],"topP":0.9,"temperature":0.7}"#;
        let content: NodeContent = serde_json::from_str(json).unwrap();
        match content {
            NodeContent::TextGeneration(generation) => {
                assert_eq!(generation.llm, "openai:gpt-4o");
                assert_eq!(generation.top_p, Some(0.9));
                assert_eq!(generation.temperature, Some(0.7));
            }
            other => panic!("wrong kind: {}", other.kind()),
        }
    }

    #[test]
    fn test_unknown_artifact_kind_deserializes() {
        let json = r#"[{"type":"imageArtifact","creatorNodeId":"nd_x"}]"#;
        let artifacts: Vec<Artifact> = serde_json::from_str(json).unwrap();
        assert!(matches!(artifacts[0], Artifact::Unknown));
        assert!(artifacts[0].creator_node_id().is_none());
    }

    #[test]
    fn test_flow_find_step_across_jobs() {
        let step_id = StepId::from_str("stp_2");
        let flow = Flow {
            id: FlowId::from_str("flw_1"),
            name: "flow".into(),
            jobs: vec![
                Job {
                    id: "jb_1".into(),
                    steps: vec![Step {
                        id: StepId::from_str("stp_1"),
                        node_id: NodeId::from_str("nd_a"),
                    }],
                },
                Job {
                    id: "jb_2".into(),
                    steps: vec![Step {
                        id: step_id.clone(),
                        node_id: NodeId::from_str("nd_b"),
                    }],
                },
            ],
        };
        assert_eq!(
            flow.find_step(&step_id).unwrap().node_id,
            NodeId::from_str("nd_b")
        );
        assert!(flow.find_step(&StepId::from_str("stp_404")).is_none());
    }
}
