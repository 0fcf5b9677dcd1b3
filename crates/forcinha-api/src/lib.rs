//! # forcinha-api
//!
//! HTTP surface for the reconciler, built with Axum: health probes and
//! endpoints that trigger an audit and return its report.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, create_app_state, run};
pub use state::AppState;
