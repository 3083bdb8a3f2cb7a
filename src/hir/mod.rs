//! High-level IR: the per-file semantic model.
//!
//! ```text
//! SourceFile ──tokenize/parse──▶ Ast ──SemanticAnalyzer──▶ SemanticModel
//!                                                           ├─ symbols
//!                                                           ├─ references
//!                                                           └─ ScopeTree
//! ```
//!
//! A [`SemanticModel`] is immutable once built. Re-analyzing a file produces
//! a fresh model with fresh [`SymbolId`]s.

mod analyzer;
mod ids;
mod input;
mod model;
mod scope;
mod symbols;

pub use analyzer::SemanticAnalyzer;
pub use ids::{ReferenceId, ScopeId, SymbolId};
pub use input::{SourceFile, language_for_path};
pub use model::SemanticModel;
pub use scope::{Scope, ScopeKind, ScopeTree};
pub use symbols::{Reference, ReferenceKind, Symbol, SymbolKind};

use crate::config::AnalyzerConfig;
use crate::syntax::{ParseResult, parse_source};

/// Parse and analyze one file.
pub fn analyze(file: &SourceFile, config: AnalyzerConfig) -> ParseResult<SemanticModel> {
    let ast = parse_source(&file.content, &file.uri, &file.language)?;
    Ok(SemanticAnalyzer::new(config).analyze(&ast, &file.uri))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_pipeline() {
        let file = SourceFile::from_uri("file:///a.ts", "export const a = 1;\na;", 1);
        let model = analyze(&file, AnalyzerConfig::default()).unwrap();
        assert_eq!(model.source_file(), "file:///a.ts");
        assert_eq!(model.language(), "typescript");
        assert_eq!(model.symbol_count(), 1);
        assert_eq!(model.reference_count(), 1);
    }

    #[test]
    fn test_analyze_reports_parse_error() {
        let file = SourceFile::from_uri("file:///bad.ts", "function (", 1);
        assert!(analyze(&file, AnalyzerConfig::default()).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_model_serde() {
        let file = SourceFile::from_uri("file:///a.ts", "function f(x) { return x; }
f(1);", 1);
        let model = analyze(&file, AnalyzerConfig::default()).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let back: SemanticModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);

        let f = back.symbols_named("f").next().unwrap();
        assert_eq!(f.kind, SymbolKind::Function);
        assert_eq!(back.references(f.id).len(), 1);
    }
}
