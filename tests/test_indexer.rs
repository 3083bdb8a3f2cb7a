//! Indexer behavior under edits, failures and concurrent use.

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use sema::hir::SymbolKind;
use sema::{
    AnalyzerConfig, IndexEvent, IndexerConfig, ProjectIndexer, ReferenceKind, SemanticQueryEngine,
    SourceFile,
};

fn file(uri: &str, content: &str, version: u64) -> SourceFile {
    SourceFile::new(uri, content, "typescript", version)
}

#[test]
fn test_snapshot_survives_reindex() {
    let indexer = ProjectIndexer::default();
    let v1 = file("file:///a.ts", "const first = 1;", 1);
    indexer.index_file(&v1).unwrap();

    let engine = SemanticQueryEngine::for_project(&indexer);
    indexer.index_file(&v1.edited("const second = 2;")).unwrap();

    // the engine still sees the model it was built from
    assert_eq!(engine.find_symbols("first", None).len(), 1);
    assert!(engine.find_symbols("second", None).is_empty());

    let fresh = SemanticQueryEngine::for_project(&indexer);
    assert!(fresh.find_symbols("first", None).is_empty());
    assert_eq!(fresh.find_symbols("second", None).len(), 1);
}

#[test]
fn test_version_change_reanalyzes() {
    let indexer = ProjectIndexer::default();
    let v1 = file("file:///a.ts", "let a;", 1);
    let first = indexer.index_file(&v1).unwrap();
    let same = indexer.index_file(&file("file:///a.ts", "let changed;", 1)).unwrap();
    // same version: the cached model wins even if the content differs
    assert!(Arc::ptr_eq(&first, &same));

    let next = indexer.index_file(&file("file:///a.ts", "let changed;", 2)).unwrap();
    assert!(!Arc::ptr_eq(&first, &next));
    assert_eq!(next.symbols().next().unwrap().name, "changed");
}

#[test]
fn test_failed_first_index_leaves_no_model() {
    let indexer = ProjectIndexer::default();
    let err = indexer.index_file(&file("file:///a.ts", "class {", 1)).unwrap_err();
    let parse = err.as_parse_error().unwrap();
    assert_eq!(parse.position.line, 1);
    assert!(indexer.model("file:///a.ts").is_none());
    assert!(indexer.get_indexed_files().is_empty());
}

#[test]
fn test_deeply_nested_file_is_rejected() {
    let indexer = ProjectIndexer::default();
    let depth = 100_000;
    let src = format!("let x = {}1{};", "[".repeat(depth), "]".repeat(depth));
    let err = indexer.index_file(&file("file:///deep.ts", &src, 1)).unwrap_err();
    let parse = err.as_parse_error().unwrap();
    assert!(parse.expected.contains("levels of nesting"), "{parse}");
    assert!(indexer.model("file:///deep.ts").is_none());

    let shallow = format!("let x = {}1{};\nx;", "[".repeat(100), "]".repeat(100));
    let model = indexer.index_file(&file("file:///deep.ts", &shallow, 2)).unwrap();
    assert_eq!(model.reference_count(), 1);
}

#[test]
fn test_concurrent_indexing() {
    let indexer = Arc::new(ProjectIndexer::default());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let indexer = indexer.clone();
            thread::spawn(move || {
                for v in 1..=5u64 {
                    let uri = format!("file:///t{t}.ts");
                    let src = format!("export function f{t}_{v}() {{}}\nf{t}_{v}();");
                    indexer.index_file(&file(&uri, &src, v)).unwrap();
                    let engine = SemanticQueryEngine::for_project(&indexer);
                    assert!(!engine.find_symbols(&format!("f{t}_"), None).is_empty());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(indexer.get_indexed_files().len(), 8);
    for t in 0..8 {
        assert_eq!(indexer.version(&format!("file:///t{t}.ts")), Some(5));
    }
    // five generations per file accumulate in the project table
    assert_eq!(indexer.symbol_count(), 40);
}

#[test]
fn test_batch_matches_sequential() {
    let sources: Vec<_> = (0..10)
        .map(|i| file(&format!("file:///m{i}.ts"), &format!("const m{i} = {i};\nm{i};"), 1))
        .collect();

    let batch = ProjectIndexer::default();
    batch.index_files(&sources);
    let sequential = ProjectIndexer::default();
    for source in &sources {
        sequential.index_file(source).unwrap();
    }

    let shape = |indexer: &ProjectIndexer| {
        indexer
            .snapshot()
            .iter()
            .map(|m| (m.source_file().to_string(), m.symbol_count(), m.reference_count()))
            .collect::<Vec<_>>()
    };
    assert_eq!(shape(&batch), shape(&sequential));
}

#[test]
fn test_events_carry_models() {
    let indexer = ProjectIndexer::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _sub = indexer.subscribe(move |event| {
        if let IndexEvent::Indexed { uri, version, model } = event {
            sink.lock().push((uri.to_string(), *version, model.symbol_count()));
        }
    });

    indexer.index_files(&[file("file:///a.ts", "let a;", 1), file("file:///b.ts", "let b, c;", 3)]);
    assert_eq!(
        *seen.lock(),
        vec![("file:///a.ts".to_string(), 1, 1), ("file:///b.ts".to_string(), 3, 2)]
    );
}

#[test]
fn test_classified_references_through_indexer() {
    let config = IndexerConfig::default()
        .with_analyzer(AnalyzerConfig::default().with_classify_references(true));
    let indexer = ProjectIndexer::new(config);
    let model = indexer
        .index_file(&file("file:///a.ts", "function run() {}\nrun();\nexport { run };", 1))
        .unwrap();
    let run = model.symbols().find(|s| s.kind == SymbolKind::Function).unwrap();
    let kinds: Vec<_> = model.references(run.id).iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![ReferenceKind::Call, ReferenceKind::Export]);
}
