//! Centralized default constants for the solmi indexer.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers; runtime overrides come from the environment (see
//! `solmi_index::IndexerConfig::from_env`).

// =============================================================================
// KEYWORD EXTRACTION
// =============================================================================

/// Maximum number of keywords kept per post.
pub const MAX_KEYWORDS: usize = 6;

/// Minimum occurrence count for a token to qualify as a keyword.
pub const MIN_KEYWORD_FREQUENCY: usize = 3;

/// Minimum token length in characters; shorter tokens are discarded.
pub const MIN_TOKEN_CHARS: usize = 2;

/// Minimum stem length in characters left after stripping a suffix.
pub const MIN_STEM_CHARS: usize = 2;

// =============================================================================
// CONTENT TREE
// =============================================================================

/// Component kind tag of the internal link block.
pub const INTERNAL_LINK_COMPONENT: &str = "internalLink";

/// Sub-field of the internal link block that holds the target post.
pub const INTERNAL_LINK_TARGET_FIELD: &str = "post";

/// Default excerpt length in characters.
pub const EXCERPT_LENGTH: usize = 100;

// =============================================================================
// INDEXING
// =============================================================================

/// Default post event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Default maximum number of posts indexed concurrently by the worker.
pub const INDEX_MAX_CONCURRENT: usize = 4;

/// Whether a post may list itself among its internal links.
pub const ALLOW_SELF_LINKS: bool = true;

// =============================================================================
// DATABASE
// =============================================================================

/// Default maximum number of connections in the pool.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Default connection timeout in seconds.
pub const DB_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default idle timeout in seconds.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default maximum connection lifetime in seconds (30 minutes).
pub const DB_MAX_LIFETIME_SECS: u64 = 1800;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

/// Enables or disables the index worker.
pub const ENV_INDEXER_ENABLED: &str = "INDEXER_ENABLED";

/// Maximum concurrently indexed posts.
pub const ENV_INDEXER_MAX_CONCURRENT: &str = "INDEXER_MAX_CONCURRENT";

/// Self-link policy override.
pub const ENV_INDEXER_ALLOW_SELF_LINKS: &str = "INDEXER_ALLOW_SELF_LINKS";

/// Maximum keywords per post.
pub const ENV_KEYWORD_MAX_COUNT: &str = "KEYWORD_MAX_COUNT";

/// Minimum keyword frequency.
pub const ENV_KEYWORD_MIN_FREQUENCY: &str = "KEYWORD_MIN_FREQUENCY";

/// PostgreSQL connection string.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
