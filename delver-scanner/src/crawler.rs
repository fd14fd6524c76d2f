use crate::config::FetcherConfig;
use crate::error::{FetchError, Result, ScanError};
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::result::CrawlResult;
use delver_core::filter::is_search_results_url;
use delver_core::{
    ContentExtractor, CrawlStatistics, CrawledPage, GraphError, GraphSnapshot, GraphStore,
    LinkFilter, NodeId,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Called with the running crawled-page count and the URL just crawled
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Outcome of visiting one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Visit {
    Crawled,
    Failed,
}

/// Owns the graph of one crawl session and drives the traversal engines.
///
/// The BFS and hybrid engines live in their own modules as further `impl`
/// blocks on this type. Everything runs sequentially: one fetch is in flight
/// at a time and the graph has a single writer.
pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    graph: GraphStore,
    link_filter: LinkFilter,
    extractor: ContentExtractor,
    progress_callback: Option<ProgressCallback>,
    cancel_token: CancellationToken,
    crawled_total: usize,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            graph: GraphStore::new(),
            link_filter: LinkFilter::default(),
            extractor: ContentExtractor::default(),
            progress_callback: None,
            cancel_token: CancellationToken::new(),
            crawled_total: 0,
        }
    }

    /// Crawler backed by the reqwest fetcher
    pub fn with_http(config: FetcherConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::new(Arc::new(fetcher)))
    }

    /// Store-level filter applied to every fetched page's links
    pub fn with_link_filter(mut self, link_filter: LinkFilter) -> Self {
        self.link_filter = link_filter;
        self
    }

    pub fn with_content_extractor(mut self, extractor: ContentExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn statistics(&self) -> CrawlStatistics {
        CrawlStatistics::from_nodes(self.graph.nodes())
    }

    pub fn graph_snapshot(&self) -> GraphSnapshot {
        self.graph.snapshot()
    }

    /// Forget every node so the next crawl starts from an empty graph
    pub fn clear_graph(&mut self) {
        self.graph.clear();
        self.crawled_total = 0;
        info!("Graph cleared");
    }

    pub(crate) fn graph_mut(&mut self) -> &mut GraphStore {
        &mut self.graph
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Sleep before a fetch. Returns false when cancelled while waiting.
    pub(crate) async fn pace(&self, delay: Duration) -> bool {
        if delay.is_zero() {
            return !self.is_cancelled();
        }

        tokio::select! {
            _ = self.cancel_token.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    /// Outbound links of a crawled node, truncated to a per-phase cap
    pub(crate) fn capped_links(&self, id: NodeId, cap: usize) -> Vec<String> {
        self.graph
            .get(id)
            .map(|node| node.outbound_links.iter().take(cap).cloned().collect())
            .unwrap_or_default()
    }

    /// Fetch one pending node and record the outcome on the graph.
    ///
    /// Fetch failures are local to the node. Only an unavailable fetcher
    /// aborts the crawl.
    pub(crate) async fn visit(&mut self, id: NodeId, run: &mut CrawlResult) -> Result<Visit> {
        let url = self
            .graph
            .get(id)
            .map(|node| node.url.clone())
            .ok_or(GraphError::UnknownNode(id))?;
        run.fetch_order.push(url.clone());

        match self.fetch_page(&url).await {
            Ok(page) => {
                let links_count = page.links.len();
                let content_length = page.content.chars().count();
                self.graph.record_success(id, page)?;
                self.crawled_total += 1;

                info!(
                    "Crawled {} ({} chars, {} links)",
                    url, content_length, links_count
                );
                if let Some(ref callback) = self.progress_callback {
                    callback(self.crawled_total, url);
                }
                Ok(Visit::Crawled)
            }
            Err(e) if e.is_unavailable() => {
                self.graph.record_failure(id)?;
                warn!("Page fetcher unavailable while fetching {}: {}", url, e);
                Err(ScanError::CollaboratorUnavailable(e.to_string()))
            }
            Err(e) => {
                warn!("Failed to crawl {}: {}", url, e);
                self.graph.record_failure(id)?;
                Ok(Visit::Failed)
            }
        }
    }

    async fn fetch_page(&self, url: &str) -> std::result::Result<CrawledPage, FetchError> {
        if is_search_results_url(url) {
            return Err(FetchError::Blocked(url.to_string()));
        }

        let fetched = self.fetcher.fetch(url).await?;
        let content = self.extractor.extract(&fetched.text_blocks);
        if !self.extractor.is_substantial(&content) {
            return Err(FetchError::ContentTooShort {
                length: content.trim().chars().count(),
            });
        }

        let links = self.link_filter.filter(url, &fetched.links);
        debug!(
            "{} raw links on {}, {} kept",
            fetched.links.len(),
            url,
            links.len()
        );

        let title = if fetched.title.trim().is_empty() {
            url.to_string()
        } else {
            fetched.title
        };

        Ok(CrawledPage {
            title,
            content,
            links,
            final_url: fetched.final_url,
        })
    }
}
