//! IDE features: high-level queries for editor handlers.
//!
//! Everything here is read-only over committed [`SemanticModel`]s. The
//! editor converts positions into [`Position`] and the returned symbols and
//! references into its own types at the boundary.
//!
//! ```ignore
//! use sema::ide::SemanticQueryEngine;
//! use sema::project::ProjectIndexer;
//!
//! let indexer = ProjectIndexer::default();
//! indexer.index_file(&file)?;
//!
//! let engine = SemanticQueryEngine::for_project(&indexer);
//! let target = engine.go_to_definition(position, &file.uri);
//! ```
//!
//! [`SemanticModel`]: crate::hir::SemanticModel
//! [`Position`]: crate::base::Position

mod query;

pub use query::SemanticQueryEngine;
