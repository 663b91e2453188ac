use std::collections::HashSet;

use weft_core::graph::{ExecutionContext, Node};
use weft_core::types::NodeId;

/// Default depth ceiling for the upstream walk.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Walk the graph upstream from `start`, collecting every node it depends
/// on, deepest dependencies first.
///
/// The visited set makes the walk cycle-safe; the depth cap additionally
/// bounds pathological chains. Dangling connections are skipped.
pub fn depended_nodes<'a>(
    context: &'a ExecutionContext,
    start: &NodeId,
    max_depth: usize,
) -> Vec<&'a Node> {
    let mut visited: HashSet<NodeId> = HashSet::new();
    visited.insert(start.clone());

    let mut frontier = vec![start.clone()];
    // (node, depth) pairs in discovery order
    let mut found: Vec<(&Node, usize)> = Vec::new();

    for depth in 1..=max_depth {
        if frontier.is_empty() {
            break;
        }
        let mut next_frontier = Vec::new();
        for target in &frontier {
            for connection in context
                .connections
                .iter()
                .filter(|connection| &connection.target_node_id == target)
            {
                if !visited.insert(connection.source_node_id.clone()) {
                    continue;
                }
                if let Some(node) = context.find_node(&connection.source_node_id) {
                    found.push((node, depth));
                    next_frontier.push(node.id.clone());
                }
            }
        }
        frontier = next_frontier;
    }

    // Deepest dependencies first, discovery order within a depth
    found.sort_by(|a, b| b.1.cmp(&a.1));
    found.into_iter().map(|(node, _)| node).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::graph::{Connection, NodeContent};
    use weft_core::types::{AgentId, ExecutionId, NodeHandleId};

    fn node(id: &str) -> Node {
        Node {
            id: NodeId::from_str(id),
            name: id.to_string(),
            content: NodeContent::Text { text: id.to_string() },
        }
    }

    fn connect(source: &str, target: &str) -> Connection {
        Connection {
            id: format!("cnnc_{source}_{target}"),
            source_node_id: NodeId::from_str(source),
            target_node_id: NodeId::from_str(target),
            target_node_handle_id: NodeHandleId::new(),
        }
    }

    fn context(nodes: Vec<Node>, connections: Vec<Connection>) -> ExecutionContext {
        let target = nodes[0].clone();
        ExecutionContext {
            agent_id: AgentId::new(),
            execution_id: ExecutionId::new(),
            node: target,
            artifacts: vec![],
            nodes,
            connections,
        }
    }

    #[test]
    fn test_chain_orders_deepest_first() {
        // c -> b -> a
        let ctx = context(
            vec![node("nd_a"), node("nd_b"), node("nd_c")],
            vec![connect("nd_b", "nd_a"), connect("nd_c", "nd_b")],
        );
        let deps = depended_nodes(&ctx, &NodeId::from_str("nd_a"), DEFAULT_MAX_DEPTH);
        let ids: Vec<_> = deps.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["nd_c", "nd_b"]);
    }

    #[test]
    fn test_cycle_terminates() {
        // a -> b -> a
        let ctx = context(
            vec![node("nd_a"), node("nd_b")],
            vec![connect("nd_b", "nd_a"), connect("nd_a", "nd_b")],
        );
        let deps = depended_nodes(&ctx, &NodeId::from_str("nd_a"), DEFAULT_MAX_DEPTH);
        let ids: Vec<_> = deps.iter().map(|n| n.id.as_str()).collect();
        // b discovered once; the back-edge to a is cut by the visited set
        assert_eq!(ids, vec!["nd_b"]);
    }

    #[test]
    fn test_depth_cap_truncates() {
        let nodes: Vec<Node> = (0..6).map(|i| node(&format!("nd_{i}"))).collect();
        let connections: Vec<Connection> = (0..5)
            .map(|i| connect(&format!("nd_{}", i + 1), &format!("nd_{i}")))
            .collect();
        let ctx = context(nodes, connections);

        let deps = depended_nodes(&ctx, &NodeId::from_str("nd_0"), 2);
        assert_eq!(deps.len(), 2);

        let all = depended_nodes(&ctx, &NodeId::from_str("nd_0"), DEFAULT_MAX_DEPTH);
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_diamond_is_visited_once() {
        //   b
        //  / \
        // d   a
        //  \ /
        //   c   (a depends on b and c, both depend on d)
        let ctx = context(
            vec![node("nd_a"), node("nd_b"), node("nd_c"), node("nd_d")],
            vec![
                connect("nd_b", "nd_a"),
                connect("nd_c", "nd_a"),
                connect("nd_d", "nd_b"),
                connect("nd_d", "nd_c"),
            ],
        );
        let deps = depended_nodes(&ctx, &NodeId::from_str("nd_a"), DEFAULT_MAX_DEPTH);
        let ids: Vec<_> = deps.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["nd_d", "nd_b", "nd_c"]);
    }

    #[test]
    fn test_no_dependencies() {
        let ctx = context(vec![node("nd_a")], vec![]);
        assert!(depended_nodes(&ctx, &NodeId::from_str("nd_a"), DEFAULT_MAX_DEPTH).is_empty());
    }
}
