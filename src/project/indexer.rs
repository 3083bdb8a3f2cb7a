//! Project-wide index of analyzed files.
//!
//! Each file runs through tokenize → parse → analyze independently, so a
//! batch is analyzed in parallel with rayon. Only the commit into the shared
//! tables takes the write lock. Models are published as `Arc`s: a reader
//! holding a model keeps that snapshot while a newer version is committed.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use rayon::prelude::*;
use smol_str::SmolStr;

use crate::config::IndexerConfig;
use crate::hir::{SemanticAnalyzer, SemanticModel, SourceFile, Symbol, SymbolId};
use crate::syntax::{ParseError, parse_source};
use super::error::{IndexError, IndexResult};
use super::events::{IndexEvent, Listeners, Subscription};

#[derive(Clone, Debug)]
struct FileEntry {
    version: u64,
    model: Arc<SemanticModel>,
}

#[derive(Debug, Default)]
struct IndexState {
    files: IndexMap<SmolStr, FileEntry>,
    /// Every symbol ever committed, unless pruning is enabled.
    symbols: IndexMap<SymbolId, Symbol>,
}

/// Result of running the per-file pipeline, before commit.
enum Prepared {
    Cached(Arc<SemanticModel>),
    Analyzed(SemanticModel),
    Failed(ParseError),
}

/// Indexes files and answers project-wide symbol lookups.
pub struct ProjectIndexer {
    config: IndexerConfig,
    analyzer: SemanticAnalyzer,
    state: RwLock<IndexState>,
    listeners: Arc<Listeners>,
}

impl ProjectIndexer {
    pub fn new(config: IndexerConfig) -> Self {
        Self {
            config,
            analyzer: SemanticAnalyzer::new(config.analyzer),
            state: RwLock::new(IndexState::default()),
            listeners: Arc::new(Listeners::default()),
        }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Analyze `file` and publish its model.
    ///
    /// If the cached model has the same version it is returned without
    /// re-analysis. On a parse error the previous model stays current and
    /// the error is returned.
    #[tracing::instrument(skip(self, file), fields(uri = %file.uri, version = file.version))]
    pub fn index_file(&self, file: &SourceFile) -> IndexResult<Arc<SemanticModel>> {
        let prepared = self.prepare(file);
        let mut events = Vec::new();
        let result = {
            let mut state = self.state.write();
            self.commit(&mut state, file, prepared, &mut events)
        };
        self.listeners.emit(&events);
        result
    }

    /// Index a batch of files. Analysis runs in parallel; results are
    /// committed in input order and returned in the same order.
    #[tracing::instrument(skip_all, fields(count = files.len()))]
    pub fn index_files(&self, files: &[SourceFile]) -> Vec<IndexResult<Arc<SemanticModel>>> {
        let prepared: Vec<Prepared> = files.par_iter().map(|file| self.prepare(file)).collect();

        let mut events = Vec::new();
        let results: Vec<_> = {
            let mut state = self.state.write();
            files
                .iter()
                .zip(prepared)
                .map(|(file, prepared)| self.commit(&mut state, file, prepared, &mut events))
                .collect()
        };
        self.listeners.emit(&events);
        results
    }

    fn prepare(&self, file: &SourceFile) -> Prepared {
        if let Some(model) = self.cached(&file.uri, file.version) {
            tracing::trace!(uri = %file.uri, version = file.version, "cache hit");
            return Prepared::Cached(model);
        }
        match parse_source(&file.content, &file.uri, &file.language) {
            Ok(ast) => Prepared::Analyzed(self.analyzer.analyze(&ast, &file.uri)),
            Err(err) => Prepared::Failed(err),
        }
    }

    fn cached(&self, uri: &str, version: u64) -> Option<Arc<SemanticModel>> {
        let state = self.state.read();
        state
            .files
            .get(uri)
            .filter(|entry| entry.version == version)
            .map(|entry| entry.model.clone())
    }

    fn commit(
        &self,
        state: &mut IndexState,
        file: &SourceFile,
        prepared: Prepared,
        events: &mut Vec<IndexEvent>,
    ) -> IndexResult<Arc<SemanticModel>> {
        let model = match prepared {
            Prepared::Cached(model) => return Ok(model),
            Prepared::Analyzed(model) => Arc::new(model),
            Prepared::Failed(error) => {
                tracing::warn!(
                    uri = %file.uri,
                    version = file.version,
                    %error,
                    kept_previous = state.files.contains_key(file.uri.as_str()),
                    "parse failed"
                );
                events.push(IndexEvent::Failed {
                    uri: file.uri.clone(),
                    version: file.version,
                    error: error.clone(),
                });
                return Err(IndexError::Parse(error));
            }
        };

        state
            .symbols
            .extend(model.symbols().map(|s| (s.id, s.clone())));
        let entry = FileEntry {
            version: file.version,
            model: model.clone(),
        };
        if let Some(previous) = state.files.insert(file.uri.clone(), entry) {
            if self.config.prune_stale_symbols {
                prune(&mut state.symbols, &previous.model);
            }
        }

        tracing::debug!(
            uri = %file.uri,
            version = file.version,
            symbols = model.symbol_count(),
            references = model.reference_count(),
            "indexed"
        );
        events.push(IndexEvent::Indexed {
            uri: file.uri.clone(),
            version: file.version,
            model: model.clone(),
        });
        Ok(model)
    }

    /// The current model for `uri`.
    pub fn model(&self, uri: &str) -> Option<Arc<SemanticModel>> {
        self.state.read().files.get(uri).map(|entry| entry.model.clone())
    }

    /// The version of the current model for `uri`.
    pub fn version(&self, uri: &str) -> Option<u64> {
        self.state.read().files.get(uri).map(|entry| entry.version)
    }

    /// Forget `uri`, returning its last model.
    #[tracing::instrument(skip(self))]
    pub fn remove_file(&self, uri: &str) -> Option<Arc<SemanticModel>> {
        let removed = {
            let mut state = self.state.write();
            let entry = state.files.shift_remove(uri)?;
            if self.config.prune_stale_symbols {
                prune(&mut state.symbols, &entry.model);
            }
            entry.model
        };
        tracing::debug!(uri, "removed");
        self.listeners.emit(&[IndexEvent::Removed { uri: SmolStr::new(uri) }]);
        Some(removed)
    }

    /// Look up a symbol in the project-wide table.
    pub fn get_symbol(&self, id: SymbolId) -> Option<Symbol> {
        self.state.read().symbols.get(&id).cloned()
    }

    /// Symbols whose name contains `query`, ignoring case.
    pub fn find_symbols(&self, query: &str) -> Vec<Symbol> {
        let needle = query.to_lowercase();
        self.state
            .read()
            .symbols
            .values()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Number of entries in the project-wide symbol table.
    pub fn symbol_count(&self) -> usize {
        self.state.read().symbols.len()
    }

    /// URIs with a current model, in first-indexed order.
    pub fn get_indexed_files(&self) -> Vec<SmolStr> {
        self.state.read().files.keys().cloned().collect()
    }

    /// All current models, in first-indexed order.
    pub fn snapshot(&self) -> Vec<Arc<SemanticModel>> {
        self.state
            .read()
            .files
            .values()
            .map(|entry| entry.model.clone())
            .collect()
    }

    /// Drop every model and the symbol table.
    pub fn clear(&self) {
        {
            let mut state = self.state.write();
            state.files.clear();
            state.symbols.clear();
        }
        tracing::debug!("cleared");
        self.listeners.emit(&[IndexEvent::Cleared]);
    }

    /// Register `listener` for index events.
    pub fn subscribe(&self, listener: impl Fn(&IndexEvent) + Send + Sync + 'static) -> Subscription {
        self.listeners.register(Arc::new(listener))
    }
}

impl Default for ProjectIndexer {
    fn default() -> Self {
        Self::new(IndexerConfig::default())
    }
}

impl std::fmt::Debug for ProjectIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ProjectIndexer")
            .field("config", &self.config)
            .field("files", &state.files.len())
            .field("symbols", &state.symbols.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn prune(symbols: &mut IndexMap<SymbolId, Symbol>, model: &SemanticModel) {
    for symbol in model.symbols() {
        symbols.shift_remove(&symbol.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn ts(uri: &str, content: &str, version: u64) -> SourceFile {
        SourceFile::new(uri, content, "typescript", version)
    }

    #[test]
    fn test_index_file_publishes_model() {
        let indexer = ProjectIndexer::default();
        let model = indexer.index_file(&ts("file:///a.ts", "const a = 1;", 1)).unwrap();
        assert_eq!(model.symbol_count(), 1);
        assert!(Arc::ptr_eq(&model, &indexer.model("file:///a.ts").unwrap()));
        assert_eq!(indexer.version("file:///a.ts"), Some(1));
        assert_eq!(indexer.symbol_count(), 1);
    }

    #[test]
    fn test_same_version_is_cached() {
        let indexer = ProjectIndexer::default();
        let file = ts("file:///a.ts", "const a = 1;", 1);
        let first = indexer.index_file(&file).unwrap();
        let second = indexer.index_file(&file).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(indexer.symbol_count(), 1);
    }

    #[test]
    fn test_parse_error_keeps_previous_model() {
        let indexer = ProjectIndexer::default();
        let good = ts("file:///a.ts", "const a = 1;", 1);
        let before = indexer.index_file(&good).unwrap();

        let err = indexer.index_file(&good.edited("const = ;")).unwrap_err();
        assert!(err.as_parse_error().is_some());
        let current = indexer.model("file:///a.ts").unwrap();
        assert!(Arc::ptr_eq(&before, &current));
        assert_eq!(indexer.version("file:///a.ts"), Some(1));
    }

    #[test]
    fn test_accumulates_stale_symbols_by_default() {
        let indexer = ProjectIndexer::default();
        let v1 = ts("file:///a.ts", "const a = 1; const b = 2;", 1);
        let old = indexer.index_file(&v1).unwrap();
        let old_b = old.symbols_named("b").next().unwrap().id;

        indexer.index_file(&v1.edited("const a = 1;")).unwrap();
        assert_eq!(indexer.get_indexed_files().len(), 1);
        assert!(indexer.get_symbol(old_b).is_some());
        assert_eq!(indexer.symbol_count(), 3);
    }

    #[test]
    fn test_prunes_stale_symbols_when_enabled() {
        let indexer = ProjectIndexer::new(IndexerConfig::default().with_prune_stale_symbols(true));
        let v1 = ts("file:///a.ts", "const a = 1; const b = 2;", 1);
        let old = indexer.index_file(&v1).unwrap();
        let old_b = old.symbols_named("b").next().unwrap().id;

        indexer.index_file(&v1.edited("const a = 1;")).unwrap();
        assert!(indexer.get_symbol(old_b).is_none());
        assert_eq!(indexer.symbol_count(), 1);

        indexer.remove_file("file:///a.ts");
        assert_eq!(indexer.symbol_count(), 0);
    }

    #[test]
    fn test_find_symbols_case_insensitive() {
        let indexer = ProjectIndexer::default();
        indexer.index_file(&ts("file:///a.ts", "class Foo {}", 1)).unwrap();
        indexer.index_file(&ts("file:///b.ts", "class FooBar {}\nclass Baz {}", 1)).unwrap();
        let mut names: Vec<_> = indexer
            .find_symbols("foo")
            .into_iter()
            .map(|s| s.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["Foo", "FooBar"]);
        assert!(indexer.find_symbols("nothing").is_empty());
    }

    #[test]
    fn test_index_files_in_parallel() {
        let indexer = ProjectIndexer::default();
        let files: Vec<_> = (0..16)
            .map(|i| ts(&format!("file:///f{i}.ts"), &format!("export const v{i} = {i};"), 1))
            .chain(std::iter::once(ts("file:///bad.ts", "let = ;", 1)))
            .collect();
        let results = indexer.index_files(&files);
        assert_eq!(results.len(), 17);
        assert!(results[..16].iter().all(Result::is_ok));
        assert!(results[16].is_err());
        let indexed = indexer.get_indexed_files();
        assert_eq!(indexed.len(), 16);
        assert_eq!(indexed[0], "file:///f0.ts");
        assert_eq!(indexer.snapshot().len(), 16);
    }

    #[test]
    fn test_remove_and_clear() {
        let indexer = ProjectIndexer::default();
        indexer.index_file(&ts("file:///a.ts", "let a;", 1)).unwrap();
        indexer.index_file(&ts("file:///b.ts", "let b;", 1)).unwrap();

        assert!(indexer.remove_file("file:///a.ts").is_some());
        assert!(indexer.remove_file("file:///a.ts").is_none());
        assert!(indexer.model("file:///a.ts").is_none());
        assert_eq!(indexer.get_indexed_files(), vec![SmolStr::new("file:///b.ts")]);

        indexer.clear();
        assert!(indexer.get_indexed_files().is_empty());
        assert_eq!(indexer.symbol_count(), 0);
    }

    #[test]
    fn test_events() {
        let indexer = ProjectIndexer::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let sub = indexer.subscribe(move |event| {
            let tag = match event {
                IndexEvent::Indexed { .. } => "indexed",
                IndexEvent::Failed { .. } => "failed",
                IndexEvent::Removed { .. } => "removed",
                IndexEvent::Cleared => "cleared",
            };
            sink.lock().push(tag);
        });

        let file = ts("file:///a.ts", "let a;", 1);
        indexer.index_file(&file).unwrap();
        indexer.index_file(&file).unwrap();
        let _ = indexer.index_file(&file.edited("let = ;"));
        indexer.remove_file("file:///a.ts");
        indexer.clear();
        assert_eq!(*log.lock(), vec!["indexed", "failed", "removed", "cleared"]);

        assert!(sub.unsubscribe());
        indexer.index_file(&file).unwrap();
        assert_eq!(log.lock().len(), 4);
    }

    #[test]
    fn test_listener_can_read_index() {
        let indexer = Arc::new(ProjectIndexer::default());
        let seen = Arc::new(Mutex::new(None));
        let (inner, sink) = (Arc::downgrade(&indexer), seen.clone());
        indexer.subscribe(move |event| {
            if let (IndexEvent::Indexed { uri, .. }, Some(indexer)) = (event, inner.upgrade()) {
                *sink.lock() = indexer.model(uri).map(|m| m.symbol_count());
            }
        });
        indexer.index_file(&ts("file:///a.ts", "let a, b;", 1)).unwrap();
        assert_eq!(*seen.lock(), Some(2));
    }
}
