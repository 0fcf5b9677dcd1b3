//! Model to entity mappers

mod link;
