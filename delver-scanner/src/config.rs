use std::time::Duration;

/// Default pause inserted before each fetch
pub const DEFAULT_DELAY_MS: u64 = 1000;
/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Phase-1 depth ceiling of the hybrid engine
pub const SEED_DEPTH_CEILING: usize = 2;

pub const DEFAULT_USER_AGENT: &str = "Delver/0.1 (research crawler)";

/// Configuration for the HTTP page fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl FetcherConfig {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: 5,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Limits for a breadth-first search crawl
#[derive(Debug, Clone)]
pub struct BfsOptions {
    pub max_depth: usize,
    pub max_pages: usize,
    pub delay: Duration,
    /// Children created per crawled page
    pub link_cap: usize,
}

impl BfsOptions {
    pub fn new() -> Self {
        Self {
            max_depth: 2,
            max_pages: 25,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            link_cap: 5,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_link_cap(mut self, link_cap: usize) -> Self {
        self.link_cap = link_cap;
        self
    }
}

impl Default for BfsOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Limits for a hybrid (BFS seed collection + DFS deep dive) crawl
#[derive(Debug, Clone)]
pub struct HybridOptions {
    /// Seed pages collected by phase 1
    pub bfs_pages: usize,
    /// Levels explored below each seed
    pub dfs_depth: usize,
    /// Global page budget across both phases
    pub max_pages: usize,
    pub delay: Duration,
    pub bfs_link_cap: usize,
    pub dfs_link_cap: usize,
}

impl HybridOptions {
    pub fn new() -> Self {
        Self {
            bfs_pages: 20,
            dfs_depth: 4,
            max_pages: 50,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            bfs_link_cap: 8,
            dfs_link_cap: 6,
        }
    }

    pub fn with_bfs_pages(mut self, bfs_pages: usize) -> Self {
        self.bfs_pages = bfs_pages;
        self
    }

    pub fn with_dfs_depth(mut self, dfs_depth: usize) -> Self {
        self.dfs_depth = dfs_depth;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_bfs_link_cap(mut self, bfs_link_cap: usize) -> Self {
        self.bfs_link_cap = bfs_link_cap;
        self
    }

    pub fn with_dfs_link_cap(mut self, dfs_link_cap: usize) -> Self {
        self.dfs_link_cap = dfs_link_cap;
        self
    }
}

impl Default for HybridOptions {
    fn default() -> Self {
        Self::new()
    }
}
