//! The immutable result of analyzing one file.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::ids::{ScopeId, SymbolId};
use super::scope::{Scope, ScopeTree};
use super::symbols::{Reference, Symbol};

/// Symbols, references and scopes of one analyzed file.
///
/// Symbols iterate in declaration order and references in source order, so
/// two analyses of the same text produce the same sequence modulo ids.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SemanticModel {
    source_file: SmolStr,
    language: SmolStr,
    symbols: IndexMap<SymbolId, Symbol>,
    references: IndexMap<SymbolId, Vec<Reference>>,
    scopes: ScopeTree,
}

impl SemanticModel {
    pub(crate) fn new(
        source_file: SmolStr,
        language: SmolStr,
        symbols: IndexMap<SymbolId, Symbol>,
        references: IndexMap<SymbolId, Vec<Reference>>,
        scopes: ScopeTree,
    ) -> Self {
        Self {
            source_file,
            language,
            symbols,
            references,
            scopes,
        }
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(&id)
    }

    /// All symbols in declaration order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.symbols.values()
    }

    /// Symbols with the given name, in declaration order.
    pub fn symbols_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a Symbol> + use<'a, 'n> {
        self.symbols.values().filter(move |s| s.name == name)
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// References to `id`; empty when it has none.
    pub fn references(&self, id: SymbolId) -> &[Reference] {
        self.references
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every reference in the file, grouped by symbol.
    pub fn all_references(&self) -> impl Iterator<Item = &Reference> + '_ {
        self.references.values().flatten()
    }

    pub fn reference_count(&self) -> usize {
        self.references.values().map(Vec::len).sum()
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id)
    }

    pub fn global_scope(&self) -> &Scope {
        self.scopes.global()
    }
}
