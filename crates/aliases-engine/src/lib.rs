//! Alias assignment engine.
//!
//! [`Registry`] manages named generator definitions and [`AliasStore`]
//! assigns, looks up, overwrites and removes aliases for a definition's
//! identifiers. Both work against any [`aliases_core::KvStore`].

pub mod definition;
pub mod registry;
pub mod store;

pub use definition::Definition;
pub use registry::Registry;
pub use store::{AliasStore, DeleteReport, DEFAULT_MAX_ATTEMPTS};
