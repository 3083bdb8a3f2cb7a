//! Loading a directory tree from disk.

use std::fs;
use std::path::Path;

use sema::project::{IndexError, WorkspaceLoader, uri_for_path};
use sema::{ProjectIndexer, SemanticQueryEngine};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/index.ts", "import { helper } from './util';\nhelper();\n");
    write(dir.path(), "src/util.ts", "export function helper() {}\n");
    write(dir.path(), "src/view.tsx", "export const title = 'x';\n");
    write(dir.path(), "lib/legacy.js", "var old = 1;\n");
    write(dir.path(), "README.md", "# not code\n");
    write(dir.path(), "node_modules/dep/index.js", "var dep = 1;\n");
    dir
}

#[test]
fn test_collect_file_paths() {
    let dir = workspace();
    let loader = WorkspaceLoader::new();
    let paths = loader.collect_file_paths(dir.path()).unwrap();
    let rel: Vec<_> = paths
        .iter()
        .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(rel, vec!["lib/legacy.js", "src/index.ts", "src/util.ts", "src/view.tsx"]);
}

#[test]
fn test_skip_extra_directory() {
    let dir = workspace();
    let loader = WorkspaceLoader::new().skip_dir("lib");
    let paths = loader.collect_file_paths(dir.path()).unwrap();
    assert_eq!(paths.len(), 3);
}

#[test]
fn test_load_directory() {
    let dir = workspace();
    let indexer = ProjectIndexer::default();
    let report = WorkspaceLoader::new()
        .load_directory(dir.path(), &indexer)
        .unwrap();
    assert!(report.is_ok());
    assert_eq!(report.indexed.len(), 4);
    assert_eq!(indexer.get_indexed_files().len(), 4);

    let engine = SemanticQueryEngine::for_project(&indexer);
    assert_eq!(engine.find_symbols("helper", None).len(), 2);

    let legacy = uri_for_path(&dir.path().join("lib/legacy.js"));
    assert_eq!(indexer.model(&legacy).unwrap().language(), "javascript");
}

#[test]
fn test_load_directory_reports_parse_errors() {
    let dir = workspace();
    write(dir.path(), "src/broken.ts", "function (\n");
    let indexer = ProjectIndexer::default();
    let report = WorkspaceLoader::new()
        .load_directory(dir.path(), &indexer)
        .unwrap();

    assert_eq!(report.indexed.len(), 4);
    assert_eq!(report.errors.len(), 1);
    let (path, err) = &report.errors[0];
    assert!(path.ends_with("broken.ts"));
    assert!(matches!(err, IndexError::Parse(_)));
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let indexer = ProjectIndexer::default();
    let err = WorkspaceLoader::new()
        .load_file(&dir.path().join("missing.ts"), &indexer)
        .unwrap_err();
    assert!(matches!(err, IndexError::Io { .. }));
}

#[test]
fn test_not_a_directory() {
    let dir = workspace();
    let indexer = ProjectIndexer::default();
    let err = WorkspaceLoader::new()
        .load_directory(&dir.path().join("README.md"), &indexer)
        .unwrap_err();
    assert!(matches!(err, IndexError::NotADirectory(_)));
}
