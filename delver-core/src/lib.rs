//! Graph data model, link filtering and statistics for Delver crawls.

pub mod content;
pub mod error;
pub mod filter;
pub mod graph;
pub mod model;
pub mod report;
pub mod snapshot;
pub mod stats;

pub use content::ContentExtractor;
pub use error::GraphError;
pub use filter::LinkFilter;
pub use graph::{GraphStore, PageMap};
pub use model::{CrawlMode, CrawledPage, GraphNode, NodeId, NodeMetadata, NodeStatus, PageRecord};
pub use snapshot::GraphSnapshot;
pub use stats::CrawlStatistics;
