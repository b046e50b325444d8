//! Structured logging schema and field name constants.
//!
//! All crates use these names for structured `tracing` fields so log
//! aggregation can query indexing runs consistently.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | An indexing branch failed, the post's index is stale |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, completed indexing runs |
//! | DEBUG | Decision points, intermediate counts |
//! | TRACE | Per-token and per-node detail |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "index", "database"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pipeline", "links", "keywords", "keyword_registry", "worker", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "index", "create", "established", "reindex"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Post being indexed.
pub const POST_ID: &str = "post_id";

/// Keyword being resolved or created.
pub const KEYWORD: &str = "keyword";

/// Namespaced post event type ("post.created", "post.updated").
pub const EVENT_TYPE: &str = "event_type";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of keywords written for a post.
pub const KEYWORD_COUNT: &str = "keyword_count";

/// Number of keywords missing from the registry snapshot and resolved
/// through upsert during sync.
pub const UPSERTED_COUNT: &str = "upserted_count";

/// Number of link targets skipped because the post does not exist.
pub const SKIPPED_COUNT: &str = "skipped_count";

/// Number of outbound links written for a post.
pub const LINK_COUNT: &str = "link_count";

/// Number of tokens produced by the tokenizer.
pub const TOKEN_COUNT: &str = "token_count";

/// Character length of flattened text.
pub const TEXT_LEN: &str = "text_len";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
