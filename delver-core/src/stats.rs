//! Aggregate statistics over a finished crawl graph.
//!
//! Status counts and connectivity are computed over every node in the graph;
//! depth and domain figures only over crawled nodes, since those are the pages
//! a consumer actually receives.

use crate::filter::host_of;
use crate::model::{GraphNode, NodeStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityMetrics {
    pub nodes_with_children: usize,
    pub nodes_with_parents: usize,
    pub children_ratio: f64,
    pub parent_ratio: f64,
    pub root_nodes: usize,
    pub leaf_nodes: usize,
    /// Average number of children per node
    pub avg_branching_factor: f64,
    /// Average outbound links per crawled node
    pub avg_links_per_page: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlStatistics {
    pub total_nodes: usize,
    pub crawled_nodes: usize,
    pub failed_nodes: usize,
    pub pending_nodes: usize,
    /// Percentage of all nodes that were crawled
    pub success_rate: f64,

    pub pages_by_depth: BTreeMap<usize, usize>,
    pub min_depth: usize,
    pub max_depth: usize,
    pub avg_depth: f64,
    pub depth_range: usize,

    pub unique_domains: usize,
    pub domain_distribution: BTreeMap<String, usize>,

    pub connectivity: ConnectivityMetrics,
}

impl CrawlStatistics {
    /// Summarize a node set. Never fails; empty input gives the zero report.
    pub fn from_nodes<'a>(nodes: impl IntoIterator<Item = &'a GraphNode>) -> Self {
        let nodes: Vec<&GraphNode> = nodes.into_iter().collect();
        if nodes.is_empty() {
            return Self::default();
        }

        let mut stats = CrawlStatistics {
            total_nodes: nodes.len(),
            ..Default::default()
        };

        let mut total_children = 0usize;
        let mut crawled_links = 0usize;

        for node in &nodes {
            match node.status {
                NodeStatus::Pending => stats.pending_nodes += 1,
                NodeStatus::Crawled => stats.crawled_nodes += 1,
                NodeStatus::Failed => stats.failed_nodes += 1,
            }

            let conn = &mut stats.connectivity;
            if node.children.is_empty() {
                conn.leaf_nodes += 1;
            } else {
                conn.nodes_with_children += 1;
            }
            if node.parent.is_some() {
                conn.nodes_with_parents += 1;
            } else {
                conn.root_nodes += 1;
            }
            total_children += node.children.len();

            if node.is_crawled() {
                crawled_links += node.outbound_links.len();
                *stats.pages_by_depth.entry(node.depth).or_default() += 1;
                let host = host_of(&node.url).unwrap_or_else(|| "unknown".to_string());
                *stats.domain_distribution.entry(host).or_default() += 1;
            }
        }

        let total = stats.total_nodes as f64;
        stats.success_rate = stats.crawled_nodes as f64 / total * 100.0;

        let conn = &mut stats.connectivity;
        conn.children_ratio = conn.nodes_with_children as f64 / total;
        conn.parent_ratio = conn.nodes_with_parents as f64 / total;
        conn.avg_branching_factor = total_children as f64 / total;
        if stats.crawled_nodes > 0 {
            conn.avg_links_per_page = crawled_links as f64 / stats.crawled_nodes as f64;
        }

        if let (Some((&min, _)), Some((&max, _))) = (
            stats.pages_by_depth.first_key_value(),
            stats.pages_by_depth.last_key_value(),
        ) {
            stats.min_depth = min;
            stats.max_depth = max;
            stats.depth_range = max - min;
            let depth_sum: usize = stats.pages_by_depth.iter().map(|(d, n)| d * n).sum();
            stats.avg_depth = depth_sum as f64 / stats.crawled_nodes as f64;
        }
        stats.unique_domains = stats.domain_distribution.len();

        stats
    }
}
