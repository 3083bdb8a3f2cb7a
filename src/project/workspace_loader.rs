use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use walkdir::{DirEntry, WalkDir};

use crate::hir::{SemanticModel, SourceFile, language_for_path};
use super::error::{IndexError, IndexResult};
use super::indexer::ProjectIndexer;

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", "dist", "build", "target"];

/// Outcome of loading a directory.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub indexed: Vec<Arc<SemanticModel>>,
    /// Files that could not be read or parsed.
    pub errors: Vec<(PathBuf, IndexError)>,
}

impl LoadReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Loads source files from disk into a [`ProjectIndexer`].
#[derive(Clone, Debug)]
pub struct WorkspaceLoader {
    skipped_dirs: Vec<String>,
}

impl WorkspaceLoader {
    pub fn new() -> Self {
        Self {
            skipped_dirs: SKIPPED_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Also skip directories with this name.
    pub fn skip_dir(mut self, name: impl Into<String>) -> Self {
        self.skipped_dirs.push(name.into());
        self
    }

    /// Paths of all analyzable files under `root`, sorted.
    pub fn collect_file_paths(&self, root: &Path) -> IndexResult<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(IndexError::NotADirectory(root.to_path_buf()));
        }
        let mut paths: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| !self.is_skipped(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!(%err, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(DirEntry::into_path)
            .filter(|path| language_for_path(path).is_some())
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn is_skipped(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.skipped_dirs.iter().any(|d| d == name))
    }

    /// Read one file into a [`SourceFile`] at version 0.
    pub fn read_file(&self, path: &Path) -> IndexResult<SourceFile> {
        let content = fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let language = language_for_path(path).unwrap_or("typescript");
        Ok(SourceFile::new(uri_for_path(path), content, language, 0))
    }

    /// Read every analyzable file under `root` and index them in parallel.
    ///
    /// Unreadable or unparsable files are reported, not fatal.
    #[tracing::instrument(skip(self, indexer), fields(root = %root.display()))]
    pub fn load_directory(&self, root: &Path, indexer: &ProjectIndexer) -> IndexResult<LoadReport> {
        let paths = self.collect_file_paths(root)?;
        let mut report = LoadReport::default();

        let read: Vec<_> = paths
            .par_iter()
            .map(|path| (path, self.read_file(path)))
            .collect();
        let mut files = Vec::with_capacity(read.len());
        let mut file_paths = Vec::with_capacity(read.len());
        for (path, result) in read {
            match result {
                Ok(file) => {
                    files.push(file);
                    file_paths.push(path.clone());
                }
                Err(err) => report.errors.push((path.clone(), err)),
            }
        }

        for (path, result) in file_paths.into_iter().zip(indexer.index_files(&files)) {
            match result {
                Ok(model) => report.indexed.push(model),
                Err(err) => report.errors.push((path, err)),
            }
        }

        tracing::info!(
            files = paths.len(),
            indexed = report.indexed.len(),
            failed = report.errors.len(),
            "workspace loaded"
        );
        Ok(report)
    }

    /// Read and index a single file.
    pub fn load_file(&self, path: &Path, indexer: &ProjectIndexer) -> IndexResult<Arc<SemanticModel>> {
        let file = self.read_file(path)?;
        indexer.index_file(&file)
    }
}

impl Default for WorkspaceLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// `file://` uri for a local path.
pub fn uri_for_path(path: &Path) -> String {
    let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let text = absolute.to_string_lossy().replace('\\', "/");
    if text.starts_with('/') {
        format!("file://{text}")
    } else {
        format!("file:///{text}")
    }
}
