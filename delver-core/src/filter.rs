//! Normalization and filtering of links discovered on a page.

use std::collections::HashSet;
use url::Url;

/// Links kept on a node after a fetch, before any per-phase cap
pub const DEFAULT_MAX_LINKS: usize = 15;

const BLOCKED_EXTENSIONS: &[&str] = &[
    // documents
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".odt", ".rtf",
    // images
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".webp", ".ico", ".tiff",
    // archives
    ".zip", ".tar", ".gz", ".tgz", ".rar", ".7z", ".bz2",
    // audio / video
    ".mp3", ".wav", ".ogg", ".flac", ".mp4", ".avi", ".mov", ".mkv", ".webm",
];

const SEARCH_RESULT_PATTERNS: &[&str] = &[
    "google.com/search",
    "bing.com/search",
    "duckduckgo.com/?q=",
    "duckduckgo.com/html/?q=",
    "search.yahoo.com/search",
];

/// Turns raw hrefs into an ordered, de-duplicated, capped list of crawlable
/// absolute URLs.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    max_links: usize,
}

impl LinkFilter {
    pub fn new(max_links: usize) -> Self {
        Self { max_links }
    }

    pub fn max_links(&self) -> usize {
        self.max_links
    }

    pub fn with_max_links(mut self, max_links: usize) -> Self {
        self.max_links = max_links;
        self
    }

    /// Filter `hrefs` found on `base`. An unparsable base yields no links.
    pub fn filter<I, S>(&self, base: &str, hrefs: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Ok(base_url) = Url::parse(base) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for href in hrefs {
            if links.len() >= self.max_links {
                break;
            }
            let Some(url) = resolve_link(&base_url, href.as_ref()) else {
                continue;
            };
            if !is_crawlable(&url) {
                continue;
            }
            let url = url.to_string();
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }

        links
    }
}

impl Default for LinkFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINKS)
    }
}

/// Resolve `href` against `base`, dropping the fragment. Returns `None` for
/// empty or fragment-only hrefs and for non-http(s) schemes.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut url = base.join(href).ok()?;
    url.set_fragment(None);

    match url.scheme() {
        "http" | "https" => Some(url),
        _ => None,
    }
}

fn is_crawlable(url: &Url) -> bool {
    let path = url.path();
    if path.len() <= 1 {
        return false;
    }

    let lower_path = path.to_lowercase();
    if BLOCKED_EXTENSIONS.iter().any(|ext| lower_path.ends_with(ext)) {
        return false;
    }

    !is_search_results_url(url.as_str())
}

/// Whether `url` points at a search engine's own result pages
pub fn is_search_results_url(url: &str) -> bool {
    SEARCH_RESULT_PATTERNS
        .iter()
        .any(|pattern| url.contains(pattern))
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Host of `url`, if it parses and has one
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}
