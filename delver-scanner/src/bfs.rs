use crate::config::BfsOptions;
use crate::crawler::{Crawler, Visit};
use crate::error::Result;
use crate::result::{CrawlResult, Termination};
use delver_core::{CrawlMode, NodeId};
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Limits for one breadth-first phase
pub(crate) struct BreadthFirstLimits {
    pub max_depth: usize,
    pub max_pages: usize,
    pub delay: Duration,
    pub link_cap: usize,
}

impl Crawler {
    /// Level-order crawl from `seeds`.
    ///
    /// Pages come back in non-decreasing depth; within a level in parent
    /// order, then in link discovery order. Nodes deeper than `max_depth`
    /// are dequeued and dropped without being fetched.
    pub async fn crawl_bfs(
        &mut self,
        seeds: &[String],
        options: &BfsOptions,
    ) -> Result<CrawlResult> {
        let started = Instant::now();
        let mut run = CrawlResult::new(CrawlMode::Search);

        info!(
            "Starting BFS crawl of {} seeds (max depth {}, max pages {})",
            seeds.len(),
            options.max_depth,
            options.max_pages
        );

        let limits = BreadthFirstLimits {
            max_depth: options.max_depth,
            max_pages: options.max_pages,
            delay: options.delay,
            link_cap: options.link_cap,
        };
        self.breadth_first(seeds, &limits, &mut run).await?;

        run.pages = self.graph().pages();
        run.elapsed = started.elapsed();
        info!(
            "BFS complete: {} pages using {} queue operations ({})",
            run.pages.len(),
            run.queue_operations,
            run.termination
        );
        Ok(run)
    }

    /// Shared breadth-first loop. Returns the nodes crawled in this phase in
    /// the order they were crawled, and sets `run.termination`.
    pub(crate) async fn breadth_first(
        &mut self,
        seeds: &[String],
        limits: &BreadthFirstLimits,
        run: &mut CrawlResult,
    ) -> Result<Vec<NodeId>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        let mut crawled = Vec::new();
        let mut attempts = 0usize;

        for url in seeds {
            if seen.insert(url.clone()) {
                queue.push_back(self.graph_mut().create_root(url));
            }
        }

        run.termination = Termination::FrontierExhausted;
        while crawled.len() < limits.max_pages {
            if self.is_cancelled() {
                run.termination = Termination::Cancelled;
                break;
            }

            let Some(id) = queue.pop_front() else {
                break;
            };
            run.queue_operations += 1;

            let depth = match self.graph().get(id) {
                Some(node) => node.depth,
                None => continue,
            };
            debug!("Queue op #{}: node {} at depth {}", run.queue_operations, id, depth);

            if depth > limits.max_depth {
                debug!("Discarding node {} beyond max depth {}", id, limits.max_depth);
                continue;
            }

            // No pause before the first fetch of the phase
            if attempts > 0 && !self.pace(limits.delay).await {
                run.termination = Termination::Cancelled;
                break;
            }
            attempts += 1;

            if self.visit(id, run).await? != Visit::Crawled {
                continue;
            }
            crawled.push(id);

            let mut children = 0;
            for link in self.capped_links(id, limits.link_cap) {
                if seen.insert(link.clone()) {
                    queue.push_back(self.graph_mut().create_child(id, &link)?);
                    children += 1;
                }
            }
            debug!("Queued {} children at depth {}", children, depth + 1);
        }

        if run.termination == Termination::FrontierExhausted && crawled.len() >= limits.max_pages {
            run.termination = Termination::BudgetReached;
        }
        Ok(crawled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubFetcher;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn url(path: &str) -> String {
        format!("https://example.com/{}", path)
    }

    fn seeds(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| url(p)).collect()
    }

    fn options() -> BfsOptions {
        BfsOptions::default()
            .with_delay(Duration::ZERO)
            .with_max_depth(2)
            .with_max_pages(10)
    }

    /// a -> [b, c], b -> [d], c -> [], d -> []
    fn small_site() -> StubFetcher {
        StubFetcher::new()
            .page(&url("a"), &["/b", "/c"])
            .page(&url("b"), &["/d"])
            .page(&url("c"), &[])
            .page(&url("d"), &[])
    }

    #[tokio::test]
    async fn test_bfs_crawls_small_site() {
        let mut crawler = Crawler::new(Arc::new(small_site()));
        let result = crawler.crawl_bfs(&seeds(&["a"]), &options()).await.unwrap();

        assert_eq!(result.pages.len(), 4);
        assert_eq!(result.pages[&url("a")].depth, 0);
        assert_eq!(result.pages[&url("b")].depth, 1);
        assert_eq!(result.pages[&url("c")].depth, 1);
        assert_eq!(result.pages[&url("d")].depth, 2);
        assert_eq!(result.pages[&url("d")].parent_url, Some(url("b")));
        assert_eq!(result.fetch_order, seeds(&["a", "b", "c", "d"]));
        assert_eq!(result.queue_operations, 4);
        assert_eq!(result.termination, Termination::FrontierExhausted);
    }

    #[tokio::test]
    async fn test_bfs_discards_nodes_beyond_max_depth() {
        let mut crawler = Crawler::new(Arc::new(small_site()));
        let result = crawler
            .crawl_bfs(&seeds(&["a"]), &options().with_max_depth(1))
            .await
            .unwrap();

        assert_eq!(result.pages.len(), 3);
        assert!(!result.fetch_order.contains(&url("d")));
        // d is dequeued and dropped
        assert_eq!(result.queue_operations, 4);
        assert_eq!(crawler.graph().len(), 4);
    }

    #[tokio::test]
    async fn test_bfs_visits_in_level_order() {
        let stub = StubFetcher::new()
            .page(&url("a"), &["/b", "/c"])
            .page(&url("b"), &["/d", "/e"])
            .page(&url("c"), &["/f"])
            .page(&url("d"), &[])
            .page(&url("e"), &[])
            .page(&url("f"), &[]);
        let mut crawler = Crawler::new(Arc::new(stub));
        let result = crawler.crawl_bfs(&seeds(&["a"]), &options()).await.unwrap();

        assert_eq!(result.fetch_order, seeds(&["a", "b", "c", "d", "e", "f"]));
        let depths: Vec<usize> = result
            .fetch_order
            .iter()
            .map(|u| result.pages[u].depth)
            .collect();
        assert!(depths.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_bfs_respects_page_budget() {
        let mut crawler = Crawler::new(Arc::new(small_site()));
        let result = crawler
            .crawl_bfs(&seeds(&["a"]), &options().with_max_pages(2))
            .await
            .unwrap();

        assert_eq!(result.pages.len(), 2);
        assert_eq!(result.fetch_order, seeds(&["a", "b"]));
        assert_eq!(result.termination, Termination::BudgetReached);
    }

    #[tokio::test]
    async fn test_bfs_link_cap_limits_children() {
        let mut crawler = Crawler::new(Arc::new(small_site()));
        let result = crawler
            .crawl_bfs(&seeds(&["a"]), &options().with_link_cap(1))
            .await
            .unwrap();

        assert_eq!(result.fetch_order, seeds(&["a", "b", "d"]));
    }

    #[tokio::test]
    async fn test_bfs_duplicate_seeds_create_one_root() {
        let mut crawler = Crawler::new(Arc::new(small_site()));
        let result = crawler
            .crawl_bfs(&seeds(&["c", "c"]), &options())
            .await
            .unwrap();

        assert_eq!(result.pages.len(), 1);
        assert_eq!(crawler.graph().len(), 1);
    }

    #[tokio::test]
    async fn test_bfs_failed_node_absent_from_pages() {
        let stub = StubFetcher::new()
            .page(&url("a"), &["/missing", "/thin", "/b"])
            .thin_page(&url("thin"))
            .page(&url("b"), &[]);
        let mut crawler = Crawler::new(Arc::new(stub));
        let result = crawler.crawl_bfs(&seeds(&["a"]), &options()).await.unwrap();

        assert_eq!(result.pages.len(), 2);
        assert!(!result.pages.contains_key(&url("missing")));
        assert!(!result.pages.contains_key(&url("thin")));

        let failed = crawler.graph().by_url(&url("missing")).unwrap();
        assert_eq!(failed.status, delver_core::NodeStatus::Failed);
        assert!(failed.outbound_links.is_empty());
        assert!(failed.children.is_empty());
    }

    #[tokio::test]
    async fn test_bfs_unavailable_fetcher_aborts() {
        let stub = StubFetcher::new()
            .page(&url("a"), &["/b", "/c"])
            .unavailable(&url("b"))
            .page(&url("c"), &[]);
        let mut crawler = Crawler::new(Arc::new(stub));
        let result = crawler.crawl_bfs(&seeds(&["a"]), &options()).await;

        assert!(matches!(
            result,
            Err(crate::error::ScanError::CollaboratorUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_bfs_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let stub = Arc::new(small_site());
        let mut crawler = Crawler::new(stub.clone()).with_cancellation(token);
        let result = crawler.crawl_bfs(&seeds(&["a"]), &options()).await.unwrap();

        assert_eq!(result.termination, Termination::Cancelled);
        assert!(result.pages.is_empty());
        assert!(stub.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_bfs_cancelled_mid_crawl_keeps_partial_result() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let mut crawler = Crawler::new(Arc::new(small_site()))
            .with_cancellation(token)
            .with_progress_callback(Arc::new(move |count: usize, _: String| {
                if count == 2 {
                    trigger.cancel();
                }
            }));
        let result = crawler.crawl_bfs(&seeds(&["a"]), &options()).await.unwrap();

        assert_eq!(result.termination, Termination::Cancelled);
        assert_eq!(result.pages.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bfs_paces_all_but_first_fetch() {
        let mut crawler = Crawler::new(Arc::new(small_site()));
        let opts = options().with_delay(Duration::from_millis(1000));

        let started = tokio::time::Instant::now();
        let result = crawler.crawl_bfs(&seeds(&["a"]), &opts).await.unwrap();

        assert_eq!(result.pages.len(), 4);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(3000));
        assert!(elapsed < Duration::from_millis(4000));
    }

    #[tokio::test]
    async fn test_bfs_depths_follow_parents() {
        let mut crawler = Crawler::new(Arc::new(small_site()));
        crawler.crawl_bfs(&seeds(&["a"]), &options()).await.unwrap();

        let graph = crawler.graph();
        for node in graph.nodes() {
            match node.parent {
                Some(parent) => assert_eq!(node.depth, graph.get(parent).unwrap().depth + 1),
                None => assert_eq!(node.depth, 0),
            }
        }
    }

    #[tokio::test]
    async fn test_bfs_is_repeatable_after_clear() {
        let mut crawler = Crawler::new(Arc::new(small_site()));
        let first = crawler.crawl_bfs(&seeds(&["a"]), &options()).await.unwrap();
        let first_stats = crawler.statistics();

        crawler.clear_graph();
        let second = crawler.crawl_bfs(&seeds(&["a"]), &options()).await.unwrap();
        let second_stats = crawler.statistics();

        assert_eq!(first.pages.len(), second.pages.len());
        assert_eq!(first_stats.crawled_nodes, second_stats.crawled_nodes);
        assert_eq!(first_stats.pages_by_depth, second_stats.pages_by_depth);
    }
}
