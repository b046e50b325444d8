//! Indexer configuration.

use solmi_core::defaults::{
    ALLOW_SELF_LINKS, ENV_INDEXER_ALLOW_SELF_LINKS, ENV_INDEXER_ENABLED,
    ENV_INDEXER_MAX_CONCURRENT, ENV_KEYWORD_MAX_COUNT, ENV_KEYWORD_MIN_FREQUENCY,
    INDEX_MAX_CONCURRENT, MAX_KEYWORDS, MIN_KEYWORD_FREQUENCY,
};
use solmi_core::KeywordConfig;

/// Configuration for the indexing pipeline and worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    /// Whether the worker processes post events.
    pub enabled: bool,
    /// Maximum number of posts indexed concurrently.
    pub max_concurrent: usize,
    /// Keep internal links from a post to itself.
    pub allow_self_links: bool,
    /// Keyword extraction settings.
    pub keywords: KeywordConfig,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_concurrent: INDEX_MAX_CONCURRENT,
            allow_self_links: ALLOW_SELF_LINKS,
            keywords: KeywordConfig::default(),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    value != "false" && value != "0"
}

impl IndexerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `INDEXER_ENABLED` | `true` | Enable/disable event-driven indexing |
    /// | `INDEXER_MAX_CONCURRENT` | `4` | Max posts indexed at once |
    /// | `INDEXER_ALLOW_SELF_LINKS` | `true` | Keep links from a post to itself |
    /// | `KEYWORD_MAX_COUNT` | `6` | Max keywords per post |
    /// | `KEYWORD_MIN_FREQUENCY` | `3` | Min occurrences for a keyword |
    pub fn from_env() -> Self {
        let enabled = std::env::var(ENV_INDEXER_ENABLED)
            .map(|v| parse_flag(&v))
            .unwrap_or(true);

        let max_concurrent = std::env::var(ENV_INDEXER_MAX_CONCURRENT)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(INDEX_MAX_CONCURRENT)
            .max(1);

        let allow_self_links = std::env::var(ENV_INDEXER_ALLOW_SELF_LINKS)
            .map(|v| parse_flag(&v))
            .unwrap_or(ALLOW_SELF_LINKS);

        let max_keywords = std::env::var(ENV_KEYWORD_MAX_COUNT)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(MAX_KEYWORDS);

        let min_frequency = std::env::var(ENV_KEYWORD_MIN_FREQUENCY)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(MIN_KEYWORD_FREQUENCY)
            .max(1);

        Self {
            enabled,
            max_concurrent,
            allow_self_links,
            keywords: KeywordConfig::default()
                .with_max_keywords(max_keywords)
                .with_min_frequency(min_frequency),
        }
    }

    /// Enable or disable event-driven indexing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set maximum concurrent indexing runs.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    pub fn with_allow_self_links(mut self, allow: bool) -> Self {
        self.allow_self_links = allow;
        self
    }

    pub fn with_keyword_config(mut self, keywords: KeywordConfig) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_max_keywords(mut self, n: usize) -> Self {
        self.keywords = self.keywords.with_max_keywords(n);
        self
    }

    pub fn with_min_frequency(mut self, n: usize) -> Self {
        self.keywords = self.keywords.with_min_frequency(n);
        self
    }
}
