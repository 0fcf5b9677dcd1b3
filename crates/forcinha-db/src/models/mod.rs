//! Database models (SQLx `FromRow`)

mod link;

pub use link::CharacterLinkModel;
