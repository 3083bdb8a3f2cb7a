//! Foundation types for the analysis pipeline.
//!
//! - [`Position`], [`Range`] - Source locations (1-indexed line/column)
//! - [`LineIndex`] - Byte offset to line/column conversion
//!
//! This module has NO dependencies on other sema modules.

mod span;

pub use span::{LineIndex, Position, Range, TextRange, TextSize};

// Re-export text-size types for convenience
pub use text_size;
