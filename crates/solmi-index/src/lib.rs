//! # solmi-index
//!
//! Post indexing pipeline for solmi.
//!
//! After every post create/update this crate:
//! - rebuilds the post's outbound internal links (inbound links follow)
//! - extracts keywords from the post text and replaces its keyword set
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use solmi_db::Database;
//! use solmi_index::{EventBus, IndexerConfig, IndexingPipeline, IndexWorker};
//!
//! let db = Database::connect("postgres://...").await?;
//! let posts = Arc::new(db.posts);
//! let keywords = Arc::new(db.keywords);
//!
//! let config = IndexerConfig::from_env();
//! let pipeline = IndexingPipeline::new(posts.clone(), keywords, &config);
//!
//! let bus = EventBus::default();
//! let handle = IndexWorker::new(pipeline, config).start(&bus);
//!
//! // After a successful save:
//! let event = posts.save(&post_id, "Title", &content).await?;
//! bus.emit(event);
//!
//! handle.shutdown().await?;
//! ```

pub mod config;
pub mod links;
pub mod pipeline;
pub mod sync;
pub mod telemetry;
pub mod worker;

// Re-export core types
pub use solmi_core::*;

pub use config::IndexerConfig;
pub use links::{collect_internal_links, LinkGraphRebuilder};
pub use pipeline::{IndexReport, IndexingPipeline};
pub use sync::{KeywordSync, SyncOutcome};
pub use telemetry::{init_tracing, LogConfig, LogFormat};
pub use worker::{IndexEvent, IndexWorker, WorkerHandle};
