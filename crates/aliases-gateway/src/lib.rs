//! HTTP adapter for the alias engine.
//!
//! Exposes definition management under `/defs` and per-definition alias
//! batches under `/defs/{name}/aliases`. Batches are exchanged either as
//! JSON or as line-delimited text, chosen by the request's content type.

pub mod app;
pub mod codec;
pub mod error;
pub mod handlers;
pub mod state;

pub use app::App;
pub use error::{AppError, Result};
pub use state::AppState;
