//! Project-wide indexing.
//!
//! - [`ProjectIndexer`] - per-file models plus a shared symbol table
//! - [`IndexEvent`] / [`Subscription`] - change notifications
//! - [`WorkspaceLoader`] - reads a directory tree from disk into an indexer

mod error;
mod events;
mod indexer;
mod workspace_loader;

pub use error::{IndexError, IndexResult};
pub use events::{IndexEvent, Subscription};
pub use indexer::ProjectIndexer;
pub use workspace_loader::{LoadReport, WorkspaceLoader, uri_for_path};
