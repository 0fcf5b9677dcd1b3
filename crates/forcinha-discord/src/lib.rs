//! # forcinha-discord
//!
//! Minimal Discord REST client: list and fetch guild members, grant and
//! revoke roles, set nicknames. Authenticates with a bot token.

mod client;
mod error;
pub mod models;

pub use client::{DiscordClient, MEMBER_PAGE_LIMIT};
pub use error::DiscordError;
