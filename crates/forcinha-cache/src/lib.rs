//! # forcinha-cache
//!
//! Key-value storage for immutable EVE entity metadata (names, tickers).
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Metadata Stores**: Redis-backed and in-memory [`MetadataStore`] implementations
//!
//! ## Example
//!
//! ```ignore
//! use forcinha_cache::{RedisMetadataStore, RedisPool, RedisPoolConfig};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let store = RedisMetadataStore::new(pool);
//! store.upsert(EntityId::new(98028546), &EntityMetadata::corporation("Forca", "FORCA")).await?;
//! ```
//!
//! [`MetadataStore`]: forcinha_core::traits::MetadataStore

pub mod metadata;
pub mod pool;

pub use metadata::{InMemoryMetadataStore, RedisMetadataStore};
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};
