use delver_core::GraphError;
use thiserror::Error;

/// Why a single page could not be fetched. Only [`FetchError::Unavailable`]
/// stops a crawl; everything else marks one node as failed.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Unsupported content type {content_type:?} for {url}")]
    UnsupportedContent {
        url: String,
        content_type: Option<String>,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Page content too short: {length} chars")]
    ContentTooShort { length: usize },

    #[error("Refusing to fetch search results page: {0}")]
    Blocked(String),

    #[error("Page fetcher unavailable: {0}")]
    Unavailable(String),
}

impl FetchError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FetchError::Unavailable(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::HttpError(e) if e.is_timeout())
    }
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Page fetcher unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientError(#[source] reqwest::Error),

    #[error("Graph error: {0}")]
    GraphError(#[from] GraphError),
}

pub type Result<T> = std::result::Result<T, ScanError>;
