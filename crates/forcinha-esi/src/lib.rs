//! # forcinha-esi
//!
//! Typed client for the public EVE Swagger Interface endpoints the
//! reconciler needs: character affiliation, character names, corporation
//! names and tickers.

mod client;
mod error;
pub mod models;

pub use client::EsiClient;
pub use error::EsiError;
