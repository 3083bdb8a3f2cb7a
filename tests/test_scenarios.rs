//! End-to-end behavior of the analysis pipeline on small programs.
//!
//! Each test runs source text through the indexer and queries the result
//! the way an editor would.

use sema::hir::{ReferenceKind, ScopeKind, SymbolKind};
use sema::{IndexerConfig, Position, ProjectIndexer, SemanticQueryEngine, SourceFile};

const URI: &str = "file:///main.ts";

fn index(source: &str) -> (ProjectIndexer, SemanticQueryEngine) {
    let indexer = ProjectIndexer::default();
    indexer
        .index_file(&SourceFile::new(URI, source, "typescript", 1))
        .unwrap();
    let engine = SemanticQueryEngine::for_project(&indexer);
    (indexer, engine)
}

#[test]
fn test_function_declaration() {
    let (indexer, _) = index("function add(a) { return a; }");
    let model = indexer.model(URI).unwrap();

    let add: Vec<_> = model.symbols_named("add").collect();
    assert_eq!(add.len(), 1);
    assert_eq!(add[0].kind, SymbolKind::Function);
    let module = model.scope(add[0].scope).unwrap();
    assert_eq!(module.kind, ScopeKind::Module);

    let function_scopes: Vec<_> = module
        .children
        .iter()
        .filter_map(|&id| model.scope(id))
        .filter(|s| s.kind == ScopeKind::Function)
        .collect();
    assert_eq!(function_scopes.len(), 1);
    let a = function_scopes[0].get("a").and_then(|id| model.symbol(id)).unwrap();
    assert_eq!(a.kind, SymbolKind::Parameter);
}

#[test]
fn test_simple_reference_resolution() {
    let (_, engine) = index("const x = 1; console.log(x);");
    let x = engine.find_symbols("^x$", None)[0];
    assert_eq!(x.kind, SymbolKind::Constant);

    let usages = engine.find_usages(x.id);
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].kind, ReferenceKind::Read);
    assert_eq!(usages[0].range.start.line_col(), (1, 26));
    assert_eq!(usages[0].range.end.line_col(), (1, 27));
}

#[test]
fn test_forward_reference_is_unresolved() {
    let (_, engine) = index("function f(){ return y; } const y = 2;");
    let y = engine.find_symbols("^y$", None)[0];
    assert!(engine.find_usages(y.id).is_empty());
}

#[test]
fn test_dead_code_detection() {
    let (_, engine) = index("function unused(){} function used(){} used();");
    let dead: Vec<_> = engine.find_dead_code().into_iter().map(|s| s.name.as_str()).collect();
    assert_eq!(dead, vec!["unused"]);
}

#[test]
fn test_cross_file_search() {
    let indexer = ProjectIndexer::default();
    indexer
        .index_file(&SourceFile::new("file:///foo.ts", "class Foo{}", "typescript", 1))
        .unwrap();
    indexer
        .index_file(&SourceFile::new("file:///foobar.ts", "class FooBar{}", "typescript", 1))
        .unwrap();

    let mut found: Vec<_> = indexer
        .find_symbols("foo")
        .into_iter()
        .map(|s| (s.name.to_string(), s.source_file.to_string()))
        .collect();
    found.sort();
    assert_eq!(
        found,
        vec![
            ("Foo".to_string(), "file:///foo.ts".to_string()),
            ("FooBar".to_string(), "file:///foobar.ts".to_string()),
        ]
    );

    let engine = SemanticQueryEngine::for_project(&indexer);
    assert_eq!(engine.find_symbols("FOO", Some(SymbolKind::Class)).len(), 2);
}

#[test]
fn test_reindex_replaces_model_and_keeps_stale_symbols() {
    let indexer = ProjectIndexer::default();
    let v1 = SourceFile::new(URI, "function keep() {}\nfunction gone() {}", "typescript", 1);
    let old = indexer.index_file(&v1).unwrap();
    let gone = old.symbols_named("gone").next().unwrap().id;

    let new = indexer.index_file(&v1.edited("function keep() {}")).unwrap();
    assert_eq!(indexer.get_indexed_files(), vec![URI]);
    assert!(new.symbols_named("gone").next().is_none());

    // the project table keeps superseded symbols unless pruning is enabled
    assert!(indexer.get_symbol(gone).is_some());
    assert_eq!(indexer.find_symbols("keep").len(), 2);
}

#[test]
fn test_reindex_with_pruning_drops_stale_symbols() {
    let indexer = ProjectIndexer::new(IndexerConfig::default().with_prune_stale_symbols(true));
    let v1 = SourceFile::new(URI, "function keep() {}\nfunction gone() {}", "typescript", 1);
    let old = indexer.index_file(&v1).unwrap();
    let gone = old.symbols_named("gone").next().unwrap().id;

    indexer.index_file(&v1.edited("function keep() {}")).unwrap();
    assert_eq!(indexer.get_indexed_files(), vec![URI]);
    assert!(indexer.get_symbol(gone).is_none());
    assert_eq!(indexer.find_symbols("keep").len(), 1);
}

#[test]
fn test_go_to_definition_across_nested_scopes() {
    let source = "\
const limit = 10;
function clamp(value: number): number {
  if (value > limit) {
    const capped = limit;
    return capped;
  }
  return value;
}
clamp(42);
";
    let (_, engine) = index(source);

    let def = engine.go_to_definition(Position::at(4, 20), URI).unwrap();
    assert_eq!(def.name, "limit");
    assert_eq!(def.range.start.line_col(), (1, 7));

    let def = engine.go_to_definition(Position::at(5, 12), URI).unwrap();
    assert_eq!(def.name, "capped");

    let visible: Vec<_> = engine
        .get_symbols_in_scope(Position::at(5, 5), URI)
        .into_iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(visible, vec!["capped", "value", "limit", "clamp"]);
}

#[test]
fn test_parse_failure_keeps_previous_model_queryable() {
    let indexer = ProjectIndexer::default();
    let v1 = SourceFile::new(URI, "let ok = 1;\nok;", "typescript", 1);
    indexer.index_file(&v1).unwrap();
    assert!(indexer.index_file(&v1.edited("let ok = (;")).is_err());

    let engine = SemanticQueryEngine::for_project(&indexer);
    let ok = engine.find_symbols("ok", None)[0];
    assert_eq!(engine.find_usages(ok.id).len(), 1);
}
