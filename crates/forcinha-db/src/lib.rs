//! # forcinha-db
//!
//! PostgreSQL storage for Discord user to EVE character links.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use forcinha_db::{create_pool, migrate, PgLinkRepository, PoolConfig};
//! use forcinha_core::traits::LinkStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&PoolConfig::default()).await?;
//!     migrate(&pool).await?;
//!     let links = PgLinkRepository::new(pool).get_all_links().await?;
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, migrate, ping, PgPool, PoolConfig};
pub use repositories::PgLinkRepository;
