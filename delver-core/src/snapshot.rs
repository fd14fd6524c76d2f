use crate::model::{GraphNode, NodeId, NodeStatus};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

const TITLE_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: NodeId,
    pub url: String,
    pub title: String,
    pub depth: usize,
    pub status: NodeStatus,
    pub links_count: usize,
    pub content_length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    ParentChild,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::ParentChild => f.write_str("parent_child"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub max_depth: usize,
}

/// Nodes and parent/child edges of a crawl graph, for visualization consumers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<SnapshotNode>,
    pub edges: Vec<SnapshotEdge>,
    pub stats: SnapshotStats,
}

impl GraphSnapshot {
    pub fn from_nodes<'a>(nodes: impl IntoIterator<Item = &'a GraphNode>) -> Self {
        let mut snapshot = GraphSnapshot::default();

        for node in nodes {
            snapshot.nodes.push(SnapshotNode {
                id: node.id,
                url: node.url.clone(),
                title: shorten_title(&node.title),
                depth: node.depth,
                status: node.status,
                links_count: node.outbound_links.len(),
                content_length: node.content.chars().count(),
            });

            if let Some(parent) = node.parent {
                snapshot.edges.push(SnapshotEdge {
                    source: parent,
                    target: node.id,
                    kind: EdgeKind::ParentChild,
                });
            }
        }

        snapshot.stats = SnapshotStats {
            total_nodes: snapshot.nodes.len(),
            total_edges: snapshot.edges.len(),
            max_depth: snapshot.nodes.iter().map(|n| n.depth).max().unwrap_or(0),
        };
        snapshot
    }

    /// Build a petgraph graph labelled by URL. Edges whose source is not part
    /// of the snapshot are left out.
    pub fn to_graph(&self) -> DiGraph<String, EdgeKind> {
        let mut graph = DiGraph::new();
        let mut indices: HashMap<NodeId, NodeIndex> = HashMap::new();

        for node in &self.nodes {
            indices.insert(node.id, graph.add_node(node.url.clone()));
        }
        for edge in &self.edges {
            let source = indices.get(&edge.source);
            let target = indices.get(&edge.target);
            if let (Some(&source), Some(&target)) = (source, target) {
                graph.add_edge(source, target, edge.kind);
            }
        }
        graph
    }

    /// Render as Graphviz DOT
    pub fn to_dot(&self) -> String {
        let graph = self.to_graph();
        format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn shorten_title(title: &str) -> String {
    if title.chars().count() > TITLE_PREVIEW_CHARS {
        let head: String = title.chars().take(TITLE_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}
