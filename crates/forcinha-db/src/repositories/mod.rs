//! Repository implementations
//!
//! PostgreSQL implementations of the storage traits defined in forcinha-core.

mod error;
mod link;

pub use link::PgLinkRepository;
