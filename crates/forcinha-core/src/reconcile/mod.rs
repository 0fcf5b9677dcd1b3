//! Pure reconciliation rules: policy evaluation and state diffing

mod differ;
mod evaluator;

pub use differ::diff;
pub use evaluator::{NICKNAME_MAX_CHARS, build_auditee, evaluate};
