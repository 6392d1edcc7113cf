//! Core types and traits for the alias service.
//!
//! This crate holds the definition model, the batch request unit, the key
//! layout and the contract the alias engine expects from its key-value
//! backend.

pub mod alias;
pub mod def;
pub mod error;
pub mod ident;
pub mod keys;
pub mod kv;

pub use alias::Alias;
pub use def::{Def, GeneratorKind, RandLimits};
pub use error::{AliasError, Result, StoreError};
pub use ident::{IdentAlias, Status};
pub use kv::{Commit, KvConn, KvStore, StoreResult, Write};
