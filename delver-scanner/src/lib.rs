//! Page fetching and the BFS / hybrid traversal engines for Delver.

mod bfs;
pub mod config;
pub mod crawler;
pub mod error;
pub mod fetcher;
mod hybrid;
pub mod result;

#[cfg(test)]
mod testing;

pub use config::{BfsOptions, FetcherConfig, HybridOptions};
pub use crawler::{Crawler, ProgressCallback};
pub use error::{FetchError, ScanError};
pub use fetcher::{FetchedPage, HttpFetcher, PageFetcher};
pub use result::{CrawlResult, Termination};
