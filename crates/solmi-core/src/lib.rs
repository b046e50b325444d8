//! # solmi-core
//!
//! Core types, traits, and text analysis for the solmi post indexer.
//!
//! This crate provides the content tree model, the keyword extractor, and
//! the repository traits that the storage and indexing crates build on.

pub mod content;
pub mod defaults;
pub mod error;
pub mod events;
pub mod keywords;
pub mod logging;
pub mod memory;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use content::{default_excerpt, excerpt, flatten};
pub use error::{Error, Result};
pub use events::{EventBus, EventEnvelope, PostEvent};
pub use keywords::{extract_keywords, KeywordConfig, KeywordExtractor};
pub use memory::MemoryStore;
pub use models::*;
pub use traits::*;
pub use uuid_utils::{is_v7, new_v7};
