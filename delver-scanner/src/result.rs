use delver_core::{CrawlMode, PageMap};
use std::fmt;
use std::time::Duration;

/// Why a traversal stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Nothing left in the frontier
    FrontierExhausted,
    /// The page budget was used up
    BudgetReached,
    /// The cancellation token fired
    Cancelled,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Termination::FrontierExhausted => "frontier exhausted",
            Termination::BudgetReached => "page budget reached",
            Termination::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct CrawlResult {
    pub mode: CrawlMode,
    /// Every crawled page in the store, keyed by URL
    pub pages: PageMap,
    /// URLs in the order they were fetched, successful or not
    pub fetch_order: Vec<String>,
    /// Nodes removed from a BFS queue, including over-depth discards
    pub queue_operations: usize,
    /// Nodes popped from DFS stacks, including skipped ones
    pub stack_operations: usize,
    /// Seeds chosen by hybrid phase 1
    pub seed_count: usize,
    pub termination: Termination,
    pub elapsed: Duration,
}

impl CrawlResult {
    pub fn new(mode: CrawlMode) -> Self {
        Self {
            mode,
            pages: PageMap::new(),
            fetch_order: Vec::new(),
            queue_operations: 0,
            stack_operations: 0,
            seed_count: 0,
            termination: Termination::FrontierExhausted,
            elapsed: Duration::from_secs(0),
        }
    }
}
