use crate::config::FetcherConfig;
use crate::error::{FetchError, Result, ScanError};
use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Elements whose text is never treated as page content
const NOISE_CONTAINERS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "iframe", "noscript",
];

/// Fragments of `div` class names that mark ads and page chrome
const NOISE_CLASSES: &[&str] = &[
    "ad", "advertisement", "sidebar", "navigation", "menu", "footer", "header",
];

const TEXT_SELECTOR: &str =
    "p, h1, h2, h3, h4, h5, h6, article, main, section, div, li, blockquote, pre, code";

/// Raw result of fetching one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedPage {
    pub title: String,
    /// Candidate text fragments, in document order
    pub text_blocks: Vec<String>,
    /// Raw `href` values, unresolved
    pub links: Vec<String>,
    /// URL after redirects, when known
    pub final_url: Option<String>,
}

/// Retrieves pages for the traversal engines.
///
/// Implementations own their timeout, retry and restart policy. Returning
/// [`FetchError::Unavailable`] tells the engine no further progress is
/// possible; any other error fails a single node.
pub trait PageFetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, std::result::Result<FetchedPage, FetchError>>;
}

/// Plain HTTP fetcher backed by reqwest and scraper
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .connect_timeout(config.timeout / 2)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .tcp_keepalive(std::time::Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(ScanError::ClientError)?;

        Ok(Self { client })
    }

    async fn fetch_page(&self, url: &str) -> std::result::Result<FetchedPage, FetchError> {
        debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // Only parse HTML content
        let is_html = content_type
            .as_ref()
            .map(|ct| ct.contains("text/html") || ct.contains("application/xhtml"))
            .unwrap_or(false);
        if !is_html {
            return Err(FetchError::UnsupportedContent {
                url: url.to_string(),
                content_type,
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await?;

        let mut page = parse_document(&body)?;
        if page.title.is_empty() {
            page.title = url.to_string();
        }
        page.final_url = Some(final_url);
        Ok(page)
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, std::result::Result<FetchedPage, FetchError>> {
        self.fetch_page(url).boxed()
    }
}

/// Pull the title, content fragments and raw links out of an HTML document
pub fn parse_document(html: &str) -> std::result::Result<FetchedPage, FetchError> {
    let document = Html::parse_document(html);

    let title_selector = selector("title")?;
    let text_selector = selector(TEXT_SELECTOR)?;
    let link_selector = selector("a[href]")?;

    let title = document
        .select(&title_selector)
        .next()
        .map(|t| normalize_whitespace(&t.text().collect::<String>()))
        .unwrap_or_default();

    let text_blocks = document
        .select(&text_selector)
        .filter(|element| !inside_noise(element))
        .map(|element| normalize_whitespace(&element.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect();

    let links = document
        .select(&link_selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.to_string())
        .collect();

    Ok(FetchedPage {
        title,
        text_blocks,
        links,
        final_url: None,
    })
}

fn selector(css: &str) -> std::result::Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::ParseError(format!("selector {}: {}", css, e)))
}

/// True when the element or any ancestor is a noise container or a `div`
/// with a noise class. Nested content tags each yield their own block.
fn inside_noise(element: &ElementRef) -> bool {
    std::iter::once(*element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|el| {
            let value = el.value();
            NOISE_CONTAINERS.contains(&value.name())
                || (value.name() == "div" && value.classes().any(is_noise_class))
        })
}

fn is_noise_class(class: &str) -> bool {
    let class = class.to_ascii_lowercase();
    NOISE_CLASSES.iter().any(|noise| class.contains(noise))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
