use crate::error::GraphError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a node in a [`GraphStore`](crate::graph::GraphStore).
///
/// Ids are handed out monotonically and are never reused, including across
/// calls to `GraphStore::clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Crawl state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Discovered, not fetched yet
    Pending,
    /// Fetched and extracted successfully
    Crawled,
    /// Fetch or extraction failed
    Failed,
}

impl NodeStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, NodeStatus::Pending)
    }

    /// Validate a status change. Only `Pending -> Crawled` and
    /// `Pending -> Failed` are allowed.
    pub fn transition(self, next: NodeStatus) -> Result<NodeStatus, GraphError> {
        match (self, next) {
            (NodeStatus::Pending, NodeStatus::Crawled | NodeStatus::Failed) => Ok(next),
            (from, to) => Err(GraphError::InvalidTransition { from, to }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Crawled => "crawled",
            NodeStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters derived from a fetched page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub content_length: usize,
    pub links_count: usize,
    pub title_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
}

/// A discovered URL and its crawl state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub url: String,
    pub title: String,
    pub content: String,
    pub depth: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub outbound_links: Vec<String>,
    pub status: NodeStatus,
    pub metadata: NodeMetadata,
    pub discovered_at: DateTime<Utc>,
}

impl GraphNode {
    pub(crate) fn new(id: NodeId, url: String, depth: usize, parent: Option<NodeId>) -> Self {
        Self {
            id,
            url,
            title: String::new(),
            content: String::new(),
            depth,
            parent,
            children: Vec::new(),
            outbound_links: Vec::new(),
            status: NodeStatus::Pending,
            metadata: NodeMetadata::default(),
            discovered_at: Utc::now(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_crawled(&self) -> bool {
        self.status == NodeStatus::Crawled
    }
}

/// Extracted result of a successful fetch, ready to be stored on a node
#[derive(Debug, Clone, Default)]
pub struct CrawledPage {
    pub title: String,
    pub content: String,
    pub links: Vec<String>,
    pub final_url: Option<String>,
}

/// Externally visible projection of a crawled node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub content: String,
    pub links: Vec<String>,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_url: Option<String>,
    pub discovered_at: DateTime<Utc>,
}

/// Traversal strategy used for a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlMode {
    /// Single-phase breadth-first search
    Search,
    /// Breadth-first seed collection followed by per-seed depth-first dives
    DeepResearch,
}

impl CrawlMode {
    pub fn label(self) -> &'static str {
        match self {
            CrawlMode::Search => "BFS (Breadth-First Search)",
            CrawlMode::DeepResearch => "BFS + DFS (Hybrid Deep Research)",
        }
    }
}
