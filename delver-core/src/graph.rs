use crate::error::{GraphError, Result};
use crate::model::{CrawledPage, GraphNode, NodeId, NodeMetadata, NodeStatus, PageRecord};
use crate::snapshot::GraphSnapshot;
use std::collections::HashMap;
use tracing::debug;

/// URL -> page record for every crawled node
pub type PageMap = HashMap<String, PageRecord>;

/// Arena of crawl nodes for one session.
///
/// Nodes live in a flat table in creation order; parent/child relations are
/// stored as [`NodeId`]s. Callers are responsible for URL de-duplication, the
/// store only keeps the latest node per URL in its index.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: Vec<GraphNode>,
    url_index: HashMap<String, NodeId>,
    // id of nodes[0]; advanced by clear() so ids are never handed out twice
    base_id: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a pending node and link it under `parent` when that node exists
    pub fn create_node(&mut self, url: &str, depth: usize, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.base_id + self.nodes.len() as u64);
        self.nodes.push(GraphNode::new(id, url.to_string(), depth, parent));
        self.url_index.insert(url.to_string(), id);

        if let Some(parent_id) = parent
            && let Some(parent_node) = self.get_mut(parent_id)
        {
            parent_node.children.push(id);
        }

        debug!("Created node {} for {} at depth {}", id, url, depth);
        id
    }

    pub fn create_root(&mut self, url: &str) -> NodeId {
        self.create_node(url, 0, None)
    }

    /// Create a node one level below `parent`
    pub fn create_child(&mut self, parent: NodeId, url: &str) -> Result<NodeId> {
        let depth = self
            .get(parent)
            .map(|node| node.depth + 1)
            .ok_or(GraphError::UnknownNode(parent))?;
        Ok(self.create_node(url, depth, Some(parent)))
    }

    pub fn get(&self, id: NodeId) -> Option<&GraphNode> {
        let index = id.0.checked_sub(self.base_id)?;
        self.nodes.get(usize::try_from(index).ok()?)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        let index = id.0.checked_sub(self.base_id)?;
        self.nodes.get_mut(usize::try_from(index).ok()?)
    }

    fn require_mut(&mut self, id: NodeId) -> Result<&mut GraphNode> {
        self.get_mut(id).ok_or(GraphError::UnknownNode(id))
    }

    /// Most recently created node for `url`
    pub fn by_url(&self, url: &str) -> Option<&GraphNode> {
        self.url_index.get(url).and_then(|id| self.get(*id))
    }

    /// All nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn crawled_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_crawled()).count()
    }

    /// Mark a pending node as crawled and store the extracted page
    pub fn record_success(&mut self, id: NodeId, page: CrawledPage) -> Result<()> {
        let node = self.require_mut(id)?;
        node.status = node.status.transition(NodeStatus::Crawled)?;
        node.metadata = NodeMetadata {
            content_length: page.content.chars().count(),
            links_count: page.links.len(),
            title_length: page.title.chars().count(),
            final_url: page.final_url,
        };
        node.title = page.title;
        node.content = page.content;
        node.outbound_links = page.links;
        Ok(())
    }

    /// Mark a pending node as failed. Failed nodes keep no links.
    pub fn record_failure(&mut self, id: NodeId) -> Result<()> {
        let node = self.require_mut(id)?;
        node.status = node.status.transition(NodeStatus::Failed)?;
        node.outbound_links.clear();
        Ok(())
    }

    pub fn page_record(&self, id: NodeId) -> Option<PageRecord> {
        let node = self.get(id).filter(|n| n.is_crawled())?;
        let parent_url = node
            .parent
            .and_then(|parent| self.get(parent))
            .map(|parent| parent.url.clone());

        Some(PageRecord {
            url: node.url.clone(),
            title: node.title.clone(),
            content: node.content.clone(),
            links: node.outbound_links.clone(),
            depth: node.depth,
            parent_url,
            discovered_at: node.discovered_at,
        })
    }

    /// Project every crawled node to a [`PageRecord`], keyed by URL
    pub fn pages(&self) -> PageMap {
        self.nodes
            .iter()
            .filter_map(|node| self.page_record(node.id))
            .map(|record| (record.url.clone(), record))
            .collect()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::from_nodes(self.nodes.iter())
    }

    /// Drop all nodes and the URL index
    pub fn clear(&mut self) {
        self.base_id += self.nodes.len() as u64;
        self.nodes.clear();
        self.url_index.clear();
        debug!("Graph store cleared");
    }
}
