//! Read-only queries over committed semantic models.

use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::Position;
use crate::hir::{Reference, SemanticModel, Symbol, SymbolId, SymbolKind};
use crate::project::ProjectIndexer;

/// Answers editor queries against one model or a project snapshot.
///
/// The engine holds `Arc`s to the models it was built from, so it sees a
/// consistent state even while the indexer commits newer versions.
#[derive(Clone, Debug)]
pub struct SemanticQueryEngine {
    models: Vec<Arc<SemanticModel>>,
    /// Source file to index in `models`.
    files: FxHashMap<SmolStr, usize>,
    /// Symbol to the index of the model declaring it.
    owners: FxHashMap<SymbolId, usize>,
}

impl SemanticQueryEngine {
    pub fn new(model: SemanticModel) -> Self {
        Self::for_model(Arc::new(model))
    }

    pub fn for_model(model: Arc<SemanticModel>) -> Self {
        Self::from_models(vec![model])
    }

    /// Query every file currently in `indexer`.
    pub fn for_project(indexer: &ProjectIndexer) -> Self {
        Self::from_models(indexer.snapshot())
    }

    fn from_models(models: Vec<Arc<SemanticModel>>) -> Self {
        let mut files = FxHashMap::default();
        let mut owners = FxHashMap::default();
        for (idx, model) in models.iter().enumerate() {
            files.entry(SmolStr::new(model.source_file())).or_insert(idx);
            owners.extend(model.symbols().map(|s| (s.id, idx)));
        }
        Self {
            models,
            files,
            owners,
        }
    }

    pub fn models(&self) -> &[Arc<SemanticModel>] {
        &self.models
    }

    fn model_for(&self, source_file: &str) -> Option<&SemanticModel> {
        let &idx = self.files.get(source_file)?;
        self.models.get(idx).map(Arc::as_ref)
    }

    fn owner_of(&self, id: SymbolId) -> Option<&SemanticModel> {
        let &idx = self.owners.get(&id)?;
        self.models.get(idx).map(Arc::as_ref)
    }

    fn all_symbols(&self) -> impl Iterator<Item = (&SemanticModel, &Symbol)> + '_ {
        self.models
            .iter()
            .flat_map(|m| m.symbols().map(move |s| (m.as_ref(), s)))
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.owner_of(id)?.symbol(id)
    }

    /// Recorded references to `id`, in source order.
    pub fn find_usages(&self, id: SymbolId) -> &[Reference] {
        self.owner_of(id)
            .map(|m| m.references(id))
            .unwrap_or_default()
    }

    /// The first symbol in `source_file` whose name range contains `pos`.
    pub fn find_symbol_at(&self, pos: Position, source_file: &str) -> Option<&Symbol> {
        self.model_for(source_file)?
            .symbols()
            .find(|s| s.range.contains(pos))
    }

    /// The symbol referenced at `pos`, if `pos` is on a resolved use site.
    pub fn go_to_definition(&self, pos: Position, source_file: &str) -> Option<&Symbol> {
        let model = self.model_for(source_file)?;
        let reference = model.all_references().find(|r| r.range.contains(pos))?;
        model.symbol(reference.symbol_id)
    }

    /// Usages of whatever symbol is under `pos`, from either its
    /// declaration or one of its use sites.
    pub fn find_references_at(&self, pos: Position, source_file: &str) -> &[Reference] {
        self.find_symbol_at(pos, source_file)
            .or_else(|| self.go_to_definition(pos, source_file))
            .map(|s| self.find_usages(s.id))
            .unwrap_or_default()
    }

    /// Symbols whose name matches `pattern`, ignoring case.
    ///
    /// `pattern` is a regular expression. If it does not compile it is
    /// matched as literal text instead.
    pub fn find_symbols(&self, pattern: &str, kind: Option<SymbolKind>) -> Vec<&Symbol> {
        let Some(regex) = compile_pattern(pattern) else {
            return Vec::new();
        };
        self.all_symbols()
            .map(|(_, s)| s)
            .filter(|s| kind.is_none_or(|k| s.kind == k))
            .filter(|s| regex.is_match(&s.name))
            .collect()
    }

    /// Symbols visible at `pos`, innermost scope first.
    pub fn get_symbols_in_scope(&self, pos: Position, source_file: &str) -> Vec<&Symbol> {
        let Some(model) = self.model_for(source_file) else {
            return Vec::new();
        };
        let scopes = model.scopes();
        let innermost = scopes.innermost_at(pos);
        scopes
            .ancestors(innermost)
            .flat_map(|scope| scope.symbols().filter_map(move |(_, id)| model.symbol(id)))
            .collect()
    }

    /// Symbols nothing refers to. Exported symbols and parameters are never
    /// reported.
    pub fn find_dead_code(&self) -> Vec<&Symbol> {
        self.all_symbols()
            .filter(|(_, s)| !s.exported && s.kind != SymbolKind::Parameter)
            .filter(|(model, s)| model.references(s.id).is_empty())
            .map(|(_, s)| s)
            .collect()
    }

    /// Symbols of one file ordered by position.
    pub fn document_symbols(&self, source_file: &str) -> Vec<&Symbol> {
        let Some(model) = self.model_for(source_file) else {
            return Vec::new();
        };
        let mut symbols: Vec<&Symbol> = model.symbols().collect();
        symbols.sort_by_key(|s| s.range.start);
        symbols
    }
}

fn compile_pattern(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::trace!(pattern, %err, "invalid pattern, matching literally");
            RegexBuilder::new(&regex::escape(pattern))
                .case_insensitive(true)
                .build()
                .ok()
        }
    }
}
