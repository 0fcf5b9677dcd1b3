//! Entity metadata stores

mod memory_store;
mod redis_store;

pub use memory_store::InMemoryMetadataStore;
pub use redis_store::RedisMetadataStore;
