//! `pydocsearch` crate (library surface).
//!
//! The primary entrypoint for end users is the `pydocsearch` binary. This
//! library module exists to support embedding (editor integrations) without
//! depending on internal crate layout.

pub use pydocsearch_core as core;
pub use pydocsearch_local as local;
