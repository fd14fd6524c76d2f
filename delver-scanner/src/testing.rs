//! In-memory page fetcher for engine tests.

use crate::error::FetchError;
use crate::fetcher::{FetchedPage, PageFetcher};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Mutex;

enum StubPage {
    Links(Vec<String>),
    Thin,
    Unavailable,
}

/// Serves canned pages keyed by URL and logs every fetch. Unknown URLs fail
/// with a 404.
#[derive(Default)]
pub(crate) struct StubFetcher {
    pages: HashMap<String, StubPage>,
    log: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A page with enough text to be kept, linking to `links`
    pub(crate) fn page(mut self, url: &str, links: &[&str]) -> Self {
        let links = links.iter().map(|l| l.to_string()).collect();
        self.pages.insert(url.to_string(), StubPage::Links(links));
        self
    }

    /// A page whose text is too short to keep
    pub(crate) fn thin_page(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), StubPage::Thin);
        self
    }

    pub(crate) fn unavailable(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), StubPage::Unavailable);
        self
    }

    /// URLs fetched so far, in order
    pub(crate) fn fetched(&self) -> Vec<String> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    fn respond(&self, url: &str) -> Result<FetchedPage, FetchError> {
        if let Ok(mut log) = self.log.lock() {
            log.push(url.to_string());
        }

        match self.pages.get(url) {
            Some(StubPage::Links(links)) => Ok(FetchedPage {
                title: format!("Page {}", url),
                text_blocks: vec![
                    format!("This is the opening paragraph of the page at {}.", url),
                    "It carries enough prose to pass the content length threshold.".to_string(),
                    "Short".to_string(),
                ],
                links: links.clone(),
                final_url: Some(url.to_string()),
            }),
            Some(StubPage::Thin) => Ok(FetchedPage {
                title: "Thin".to_string(),
                text_blocks: vec!["Barely anything to read here at all, sorry.".to_string()],
                links: Vec::new(),
                final_url: None,
            }),
            Some(StubPage::Unavailable) => {
                Err(FetchError::Unavailable("browser crashed".to_string()))
            }
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

impl PageFetcher for StubFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchedPage, FetchError>> {
        let response = self.respond(url);
        async move { response }.boxed()
    }
}
