use crate::bfs::BreadthFirstLimits;
use crate::config::{HybridOptions, SEED_DEPTH_CEILING};
use crate::crawler::{Crawler, Visit};
use crate::error::Result;
use crate::result::{CrawlResult, Termination};
use delver_core::{CrawlMode, NodeId};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

impl Crawler {
    /// Two-phase deep research crawl.
    ///
    /// Phase 1 collects up to `bfs_pages` seeds breadth-first, never deeper
    /// than depth 2. Phase 2 dives depth-first below each seed in discovery
    /// order, at most `dfs_depth` levels further, until the global page
    /// budget runs out.
    pub async fn crawl_hybrid(
        &mut self,
        seeds: &[String],
        options: &HybridOptions,
    ) -> Result<CrawlResult> {
        let started = Instant::now();
        let mut run = CrawlResult::new(CrawlMode::DeepResearch);

        info!("Phase 1: collecting up to {} seed pages breadth-first", options.bfs_pages);
        let limits = BreadthFirstLimits {
            max_depth: SEED_DEPTH_CEILING,
            max_pages: options.bfs_pages,
            delay: options.delay,
            link_cap: options.bfs_link_cap,
        };
        let seed_nodes = self.breadth_first(seeds, &limits, &mut run).await?;
        run.seed_count = seed_nodes.len();
        info!(
            "Phase 1 complete: {} seeds using {} queue operations",
            seed_nodes.len(),
            run.queue_operations
        );

        if run.termination == Termination::Cancelled {
            return Ok(self.finish(run, started));
        }
        if seed_nodes.is_empty() {
            warn!("No seed pages collected, skipping depth-first phase");
        }

        run.termination = self.deep_dive(&seed_nodes, options, &mut run).await?;
        Ok(self.finish(run, started))
    }

    async fn deep_dive(
        &mut self,
        seed_nodes: &[NodeId],
        options: &HybridOptions,
        run: &mut CrawlResult,
    ) -> Result<Termination> {
        let mut crawled_urls: HashSet<String> = seed_nodes
            .iter()
            .filter_map(|id| self.graph().get(*id))
            .map(|node| node.url.clone())
            .collect();
        let mut total = self.graph().crawled_count();

        info!(
            "Phase 2: depth-first dive {} levels below each of {} seeds",
            options.dfs_depth,
            seed_nodes.len()
        );

        for (index, &seed) in seed_nodes.iter().enumerate() {
            if total >= options.max_pages {
                info!("Reached max pages limit ({}), stopping", options.max_pages);
                return Ok(Termination::BudgetReached);
            }

            let Some(seed_depth) = self.graph().get(seed).map(|node| node.depth) else {
                continue;
            };
            let max_absolute_depth = seed_depth.saturating_add(options.dfs_depth);

            let mut stack: Vec<NodeId> = Vec::new();
            let mut queued: HashSet<String> = HashSet::new();
            let pushed = self.push_children(
                seed,
                options.dfs_link_cap,
                &crawled_urls,
                &mut queued,
                &mut stack,
            )?;
            if pushed == 0 {
                debug!("Seed {} has no unexplored links", index + 1);
                continue;
            }
            info!(
                "Diving from seed {}/{} with {} links (max depth {})",
                index + 1,
                seed_nodes.len(),
                pushed,
                max_absolute_depth
            );

            while total < options.max_pages {
                if self.is_cancelled() {
                    return Ok(Termination::Cancelled);
                }

                let Some(id) = stack.pop() else {
                    break;
                };
                run.stack_operations += 1;

                let Some((url, depth)) = self.graph().get(id).map(|n| (n.url.clone(), n.depth))
                else {
                    continue;
                };
                debug!("Stack op #{}: node {} at depth {}", run.stack_operations, id, depth);

                if depth > max_absolute_depth {
                    debug!("Skipping node {} beyond depth {}", id, max_absolute_depth);
                    continue;
                }
                // Another branch may have crawled this URL after it was pushed
                if crawled_urls.contains(&url) {
                    debug!("Skipping already crawled {}", url);
                    continue;
                }

                if !self.pace(options.delay).await {
                    return Ok(Termination::Cancelled);
                }

                if self.visit(id, run).await? != Visit::Crawled {
                    continue;
                }
                total += 1;
                crawled_urls.insert(url);

                if depth < max_absolute_depth {
                    self.push_children(
                        id,
                        options.dfs_link_cap,
                        &crawled_urls,
                        &mut queued,
                        &mut stack,
                    )?;
                }
            }
        }

        if total >= options.max_pages {
            Ok(Termination::BudgetReached)
        } else {
            Ok(Termination::FrontierExhausted)
        }
    }

    /// Create child nodes for the capped links of `parent` that are neither
    /// crawled nor already queued in this branch, pushing them in link order.
    fn push_children(
        &mut self,
        parent: NodeId,
        cap: usize,
        crawled_urls: &HashSet<String>,
        queued: &mut HashSet<String>,
        stack: &mut Vec<NodeId>,
    ) -> Result<usize> {
        let mut pushed = 0;
        for link in self.capped_links(parent, cap) {
            if crawled_urls.contains(&link) || !queued.insert(link.clone()) {
                continue;
            }
            stack.push(self.graph_mut().create_child(parent, &link)?);
            pushed += 1;
        }
        Ok(pushed)
    }

    fn finish(&self, mut run: CrawlResult, started: Instant) -> CrawlResult {
        run.pages = self.graph().pages();
        run.elapsed = started.elapsed();
        info!(
            "Hybrid crawl complete: {} pages, {} queue ops, {} stack ops ({})",
            run.pages.len(),
            run.queue_operations,
            run.stack_operations,
            run.termination
        );
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubFetcher;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn url(path: &str) -> String {
        format!("https://example.com/{}", path)
    }

    fn seeds(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| url(p)).collect()
    }

    fn options() -> HybridOptions {
        HybridOptions::default().with_delay(Duration::ZERO)
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
    async fn test_hybrid_single_seed_dives_lifo() {
        let mut crawler = Crawler::new(Arc::new(small_site()));
        let opts = options().with_bfs_pages(1).with_dfs_depth(1);
        let result = crawler.crawl_hybrid(&seeds(&["a"]), &opts).await.unwrap();

        assert_eq!(result.fetch_order, seeds(&["a", "c", "b"]));
        assert_eq!(result.pages.len(), 3);
        assert_eq!(result.seed_count, 1);
        assert_eq!(result.stack_operations, 2);
        assert_eq!(result.mode, CrawlMode::DeepResearch);
        assert_eq!(result.termination, Termination::FrontierExhausted);
        // b sits at the seed's depth limit, so d is never reached
        assert!(!result.pages.contains_key(&url("d")));
    }

    #[tokio::test]
    async fn test_hybrid_stack_pops_most_recent_first() {
        let stub = StubFetcher::new()
            .page(&url("a"), &["/b", "/c", "/d"])
            .page(&url("b"), &[])
            .page(&url("c"), &["/e", "/f"])
            .page(&url("d"), &[])
            .page(&url("e"), &[])
            .page(&url("f"), &[]);
        let mut crawler = Crawler::new(Arc::new(stub));
        let opts = options().with_bfs_pages(1).with_dfs_depth(2);
        let result = crawler.crawl_hybrid(&seeds(&["a"]), &opts).await.unwrap();

        assert_eq!(result.fetch_order, seeds(&["a", "d", "c", "f", "e", "b"]));
        assert_eq!(result.pages[&url("f")].depth, 2);
        assert_eq!(result.pages[&url("f")].parent_url, Some(url("c")));
    }

    #[tokio::test]
    async fn test_hybrid_seeds_stay_within_depth_ceiling() {
        let stub = StubFetcher::new()
            .page(&url("a"), &["/b"])
            .page(&url("b"), &["/c"])
            .page(&url("c"), &["/d"])
            .page(&url("d"), &["/e"])
            .page(&url("e"), &[]);
        let mut crawler = Crawler::new(Arc::new(stub));
        let opts = options().with_bfs_pages(10).with_dfs_depth(1);
        let result = crawler.crawl_hybrid(&seeds(&["a"]), &opts).await.unwrap();

        assert_eq!(result.seed_count, 3);
        assert_eq!(result.fetch_order, seeds(&["a", "b", "c", "d"]));
        assert_eq!(result.pages[&url("d")].depth, 3);
        assert!(!result.pages.contains_key(&url("e")));
    }

    #[tokio::test]
    async fn test_hybrid_seed_count_bounded_by_bfs_pages() {
        let mut crawler = Crawler::new(Arc::new(small_site()));
        let opts = options().with_bfs_pages(2).with_dfs_depth(0);
        let result = crawler.crawl_hybrid(&seeds(&["a"]), &opts).await.unwrap();

        assert_eq!(result.seed_count, 2);
        // dfs_depth 0 leaves every child past the limit
        assert_eq!(result.fetch_order, seeds(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_hybrid_respects_global_budget() {
        let mut crawler = Crawler::new(Arc::new(small_site()));
        let opts = options().with_bfs_pages(1).with_dfs_depth(3).with_max_pages(2);
        let result = crawler.crawl_hybrid(&seeds(&["a"]), &opts).await.unwrap();

        assert_eq!(result.fetch_order, seeds(&["a", "c"]));
        assert_eq!(result.pages.len(), 2);
        assert_eq!(result.termination, Termination::BudgetReached);
    }

    #[tokio::test]
    async fn test_hybrid_skips_urls_crawled_by_earlier_branch() {
        let stub = StubFetcher::new()
            .page(&url("a"), &["/x"])
            .page(&url("b"), &["/x"])
            .page(&url("x"), &[]);
        let mut crawler = Crawler::new(Arc::new(stub));
        let opts = options().with_bfs_pages(2).with_dfs_depth(1).with_bfs_link_cap(0);
        let result = crawler.crawl_hybrid(&seeds(&["a", "b"]), &opts).await.unwrap();

        assert_eq!(result.seed_count, 2);
        assert_eq!(result.fetch_order, seeds(&["a", "b", "x"]));
        assert_eq!(result.pages[&url("x")].parent_url, Some(url("a")));
    }

    #[tokio::test]
    async fn test_hybrid_unbounded_dive_depth_below_deeper_seed() {
        let stub = StubFetcher::new()
            .page(&url("a"), &["/b"])
            .page(&url("b"), &["/c"])
            .page(&url("c"), &[]);
        let mut crawler = Crawler::new(Arc::new(stub));
        let opts = options().with_bfs_pages(2).with_dfs_depth(usize::MAX);
        let result = crawler.crawl_hybrid(&seeds(&["a"]), &opts).await.unwrap();

        assert_eq!(result.seed_count, 2);
        assert_eq!(result.pages[&url("b")].depth, 1);
        assert_eq!(result.fetch_order, seeds(&["a", "b", "c"]));
        assert_eq!(result.pages[&url("c")].parent_url, Some(url("b")));
        assert_eq!(result.termination, Termination::FrontierExhausted);
    }

    #[tokio::test]
    async fn test_hybrid_failed_dive_node_does_not_stop_branch() {
        let stub = Arc::new(
            StubFetcher::new()
                .page(&url("a"), &["/b", "/missing"])
                .page(&url("b"), &[]),
        );
        let mut crawler = Crawler::new(stub.clone());
        let opts = options().with_bfs_pages(1).with_dfs_depth(2);
        let result = crawler.crawl_hybrid(&seeds(&["a"]), &opts).await.unwrap();

        assert_eq!(result.fetch_order, seeds(&["a", "missing", "b"]));
        assert_eq!(stub.fetched(), seeds(&["a", "missing", "b"]));
        assert_eq!(result.stack_operations, 2);
        assert_eq!(result.pages.len(), 2);
        assert!(!result.pages.contains_key(&url("missing")));

        let failed = crawler.graph().by_url(&url("missing")).unwrap();
        assert_eq!(failed.status, delver_core::NodeStatus::Failed);
        assert!(failed.children.is_empty());
        assert!(failed.outbound_links.is_empty());
    }

    #[tokio::test]
    async fn test_hybrid_unavailable_fetcher_aborts_dive() {
        let stub = Arc::new(
            StubFetcher::new()
                .page(&url("a"), &["/b", "/c"])
                .page(&url("b"), &[])
                .unavailable(&url("c")),
        );
        let mut crawler = Crawler::new(stub.clone());
        let opts = options().with_bfs_pages(1).with_dfs_depth(2);
        let result = crawler.crawl_hybrid(&seeds(&["a"]), &opts).await;

        assert!(matches!(
            result,
            Err(crate::error::ScanError::CollaboratorUnavailable(_))
        ));
        // c is popped first; b is never fetched
        assert_eq!(stub.fetched(), seeds(&["a", "c"]));
        let failed = crawler.graph().by_url(&url("c")).unwrap();
        assert_eq!(failed.status, delver_core::NodeStatus::Failed);
    }

    #[tokio::test]
    async fn test_hybrid_without_seeds_returns_empty() {
        let stub = Arc::new(StubFetcher::new());
        let mut crawler = Crawler::new(stub.clone());
        let result = crawler.crawl_hybrid(&seeds(&["a"]), &options()).await.unwrap();

        assert_eq!(result.seed_count, 0);
        assert!(result.pages.is_empty());
        assert_eq!(stub.fetched(), seeds(&["a"]));
    }

    #[tokio::test]
    async fn test_hybrid_cancelled_between_phases() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let mut crawler = Crawler::new(Arc::new(small_site()))
            .with_cancellation(token)
            .with_progress_callback(Arc::new(move |_: usize, _: String| trigger.cancel()));
        let opts = options().with_bfs_pages(1);
        let result = crawler.crawl_hybrid(&seeds(&["a"]), &opts).await.unwrap();

        assert_eq!(result.termination, Termination::Cancelled);
        assert_eq!(result.fetch_order, seeds(&["a"]));
        assert_eq!(result.stack_operations, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hybrid_paces_every_dive_fetch() {
        let mut crawler = Crawler::new(Arc::new(small_site()));
        let opts = options()
            .with_bfs_pages(1)
            .with_dfs_depth(1)
            .with_delay(Duration::from_millis(1000));

        let started = tokio::time::Instant::now();
        let result = crawler.crawl_hybrid(&seeds(&["a"]), &opts).await.unwrap();

        assert_eq!(result.pages.len(), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(2000));
        assert!(elapsed < Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn test_hybrid_dive_nodes_within_seed_depth() {
        let stub = StubFetcher::new()
            .page(&url("a"), &["/b"])
            .page(&url("b"), &["/c"])
            .page(&url("c"), &["/d"])
            .page(&url("d"), &["/e"])
            .page(&url("e"), &["/f"])
            .page(&url("f"), &[]);
        let mut crawler = Crawler::new(Arc::new(stub));
        let opts = options().with_bfs_pages(1).with_dfs_depth(2);
        let result = crawler.crawl_hybrid(&seeds(&["a"]), &opts).await.unwrap();

        assert_eq!(result.fetch_order, seeds(&["a", "b", "c"]));
        assert!(result.pages.values().all(|page| page.depth <= 2));
    }

    #[tokio::test]
    async fn test_hybrid_is_repeatable_after_clear() {
        let mut crawler = Crawler::new(Arc::new(small_site()));
        let opts = options().with_bfs_pages(1).with_dfs_depth(2);

        let first = crawler.crawl_hybrid(&seeds(&["a"]), &opts).await.unwrap();
        let first_stats = crawler.statistics();
        crawler.clear_graph();
        let second = crawler.crawl_hybrid(&seeds(&["a"]), &opts).await.unwrap();

        assert_eq!(first.fetch_order, second.fetch_order);
        assert_eq!(first_stats.pages_by_depth, crawler.statistics().pages_by_depth);
        assert_eq!(first_stats.crawled_nodes, crawler.statistics().crawled_nodes);
    }
}
