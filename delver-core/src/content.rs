/// Upper bound on stored page text, in chars
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 5000;
/// Fragments this short or shorter are dropped
pub const DEFAULT_MIN_FRAGMENT_CHARS: usize = 30;
/// Pages with less extracted text than this are treated as failed fetches
pub const DEFAULT_MIN_PAGE_CHARS: usize = 100;

const BOILERPLATE_MARKERS: &[&str] = &[
    "cookie",
    "privacy policy",
    "terms of service",
    "subscribe",
    "newsletter",
    "advertisement",
];

/// Reduces the text blocks of a fetched page to the content stored on a node
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    max_chars: usize,
    min_fragment_chars: usize,
    min_page_chars: usize,
}

impl ContentExtractor {
    pub fn new() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CONTENT_CHARS,
            min_fragment_chars: DEFAULT_MIN_FRAGMENT_CHARS,
            min_page_chars: DEFAULT_MIN_PAGE_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn with_min_fragment_chars(mut self, min_fragment_chars: usize) -> Self {
        self.min_fragment_chars = min_fragment_chars;
        self
    }

    pub fn with_min_page_chars(mut self, min_page_chars: usize) -> Self {
        self.min_page_chars = min_page_chars;
        self
    }

    pub fn min_page_chars(&self) -> usize {
        self.min_page_chars
    }

    /// Join the meaningful fragments and truncate to the configured length
    pub fn extract<S: AsRef<str>>(&self, fragments: &[S]) -> String {
        let kept: Vec<&str> = fragments
            .iter()
            .map(|f| f.as_ref().trim())
            .filter(|f| f.chars().count() > self.min_fragment_chars)
            .filter(|f| !is_boilerplate(f))
            .collect();

        kept.join(" ").chars().take(self.max_chars).collect()
    }

    /// Whether extracted content is long enough to keep the page
    pub fn is_substantial(&self, content: &str) -> bool {
        content.trim().chars().count() >= self.min_page_chars
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn is_boilerplate(fragment: &str) -> bool {
    let lower = fragment.to_lowercase();
    BOILERPLATE_MARKERS.iter().any(|marker| lower.contains(marker))
}
