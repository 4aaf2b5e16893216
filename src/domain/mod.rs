//! Domain layer types and invariants.

pub mod context;
pub mod error;
pub mod posts;
pub mod slug;
