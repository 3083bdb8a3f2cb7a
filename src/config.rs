//! Analyzer and indexer options.
//!
//! Both structs are plain data with builder-style setters. With the `serde`
//! feature they can be loaded from an editor's settings file.

/// Options for [`SemanticAnalyzer`](crate::hir::SemanticAnalyzer).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalyzerConfig {
    /// Tag references as `call`, `write` or `export` from their syntactic
    /// position. When off, every reference is a `read`.
    pub classify_references: bool,
    /// Attach the nearest preceding `/** ... */` comment to each symbol.
    pub collect_documentation: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            classify_references: false,
            collect_documentation: true,
        }
    }
}

impl AnalyzerConfig {
    pub fn with_classify_references(mut self, enabled: bool) -> Self {
        self.classify_references = enabled;
        self
    }

    pub fn with_collect_documentation(mut self, enabled: bool) -> Self {
        self.collect_documentation = enabled;
        self
    }
}

/// Options for [`ProjectIndexer`](crate::project::ProjectIndexer).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IndexerConfig {
    pub analyzer: AnalyzerConfig,
    /// Drop a file's previous symbols from the project symbol table when it
    /// is re-indexed or removed. Off by default: superseded symbols stay
    /// retrievable by id.
    pub prune_stale_symbols: bool,
}

impl IndexerConfig {
    pub fn with_analyzer(mut self, analyzer: AnalyzerConfig) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_prune_stale_symbols(mut self, enabled: bool) -> Self {
        self.prune_stale_symbols = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IndexerConfig::default();
        assert!(!config.prune_stale_symbols);
        assert!(!config.analyzer.classify_references);
        assert!(config.analyzer.collect_documentation);
    }

    #[test]
    fn test_builders() {
        let config = IndexerConfig::default()
            .with_prune_stale_symbols(true)
            .with_analyzer(AnalyzerConfig::default().with_classify_references(true));
        assert!(config.prune_stale_symbols);
        assert!(config.analyzer.classify_references);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_settings_fill_defaults() {
        let config: IndexerConfig =
            serde_json::from_str(r#"{ "analyzer": { "classify_references": true } }"#).unwrap();
        assert!(config.analyzer.classify_references);
        assert!(config.analyzer.collect_documentation);
        assert!(!config.prune_stale_symbols);
    }
}
