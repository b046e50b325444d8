//! # solmi-db
//!
//! PostgreSQL storage layer for solmi.
//!
//! This crate provides:
//! - Connection pool management
//! - Post storage with the internal link graph and keyword associations
//! - The keyword registry, unique by normalized value
//! - Embedded schema migrations
//!
//! ## Example
//!
//! ```rust,ignore
//! use solmi_db::{Database, PostId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/solmi").await?;
//!     db.migrate().await?;
//!
//!     let event = db
//!         .posts
//!         .save(&PostId::new("post-1"), "Hello", &serde_json::json!([]))
//!         .await?;
//!     println!("{}", event.event_type());
//!     Ok(())
//! }
//! ```
pub mod keywords;
pub mod pool;
pub mod posts;

// Always compiled so integration tests (in tests/) can use it.
pub mod test_fixtures;

// Re-export core types
pub use solmi_core::*;

pub use keywords::PgKeywordRepository;
pub use pool::{create_pool, create_pool_with_config, create_pool_with_connect_options, PoolConfig};
pub use posts::PgPostRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Posts, their internal links, and keyword associations.
    pub posts: PgPostRepository,
    /// Keyword registry.
    pub keywords: PgKeywordRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            posts: PgPostRepository::new(pool.clone()),
            keywords: PgKeywordRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
