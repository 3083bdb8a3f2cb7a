//! # sema
//!
//! Semantic core of the Pulse editor: lexing, parsing, scope resolution and
//! project-wide symbol queries for TypeScript and JavaScript sources.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide     → SemanticQueryEngine (usages, definitions, dead code)
//!   ↓
//! project → ProjectIndexer, index events, workspace loader
//!   ↓
//! hir     → SemanticAnalyzer, SemanticModel, scopes and symbols
//!   ↓
//! syntax  → Lexer + recursive-descent parser + arena AST
//!   ↓
//! base    → Primitives (Position, Range, LineIndex)
//! ```
//!
//! `config` holds the analyzer and indexer options.

/// Foundation types: positions, ranges, line index
pub mod base;

/// Analyzer and indexer options
pub mod config;

/// Tokens, syntax tree and parser
pub mod syntax;

/// Semantic model: symbols, references, scopes
pub mod hir;

/// Project-wide index over many files
pub mod project;

/// IDE features: find usages, go to definition, symbol search
pub mod ide;

pub use base::{LineIndex, Position, Range, TextRange, TextSize};
pub use config::{AnalyzerConfig, IndexerConfig};
pub use hir::{
    Reference, ReferenceKind, Scope, ScopeId, ScopeKind, SemanticAnalyzer, SemanticModel,
    SourceFile, Symbol, SymbolId, SymbolKind,
};
pub use ide::SemanticQueryEngine;
pub use project::{IndexError, IndexEvent, ProjectIndexer, Subscription, WorkspaceLoader};
pub use syntax::{ParseError, keywords};
