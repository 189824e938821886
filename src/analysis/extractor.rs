//! File and directory-tree extraction.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::analysis::{python_analyzer, PythonAnalyzer, SourceUnit};
use crate::error::{Error, Result};

/// Directory names never descended into.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    "venv",
    ".venv",
    "env",
    "node_modules",
    "build",
    "dist",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    ".eggs",
];

/// Extracts [`SourceUnit`]s from files and directory trees.
pub struct Extractor {
    analyzer: &'static PythonAnalyzer,
    exclude_dirs: HashSet<String>,
    excluded_paths: GlobSet,
}

impl Extractor {
    /// Extractor with the default excluded directories and no glob exclusions.
    pub fn new() -> Result<Self> {
        Ok(Self {
            analyzer: python_analyzer()?,
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|d| d.to_string()).collect(),
            excluded_paths: GlobSet::empty(),
        })
    }

    /// Also skip the given directory names.
    pub fn exclude_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Skip paths matching any of the glob patterns. Patterns are matched
    /// against the path relative to the walked root.
    pub fn exclude_globs<S: AsRef<str>>(
        mut self,
        patterns: &[S],
    ) -> std::result::Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern.as_ref())?);
        }
        self.excluded_paths = builder.build()?;
        Ok(self)
    }

    pub fn analyzer(&self) -> &'static PythonAnalyzer {
        self.analyzer
    }

    /// Read, decode and parse one file.
    pub fn extract_file(&self, path: &Path) -> Result<SourceUnit> {
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        self.analyzer.analyze_bytes(path, &bytes)
    }

    /// Extract a single file, or every `.py` file below a directory.
    ///
    /// Files are visited in file-name order. A file that fails to extract is
    /// logged and left out.
    pub fn extract_tree(&self, root: &Path) -> Vec<SourceUnit> {
        if root.is_file() {
            return match self.extract_file(root) {
                Ok(unit) => vec![unit],
                Err(e) => {
                    warn!(path = %root.display(), error = %e, "skipping file");
                    Vec::new()
                }
            };
        }

        let mut units = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !self.exclude_dirs.contains(name.as_ref())
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "cannot read directory entry");
                    continue;
                }
            };
            let path = entry.path();
            let is_python = path.extension().and_then(|e| e.to_str()) == Some("py");
            if !entry.file_type().is_file() || !is_python {
                continue;
            }
            if self.is_path_excluded(root, path) {
                debug!(path = %path.display(), "excluded by pattern");
                continue;
            }
            match self.extract_file(path) {
                Ok(unit) => units.push(unit),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping file"),
            }
        }

        units
    }

    fn is_path_excluded(&self, root: &Path, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        self.excluded_paths.is_match(relative) || self.excluded_paths.is_match(path)
    }
}

/// Extract one file with the default extractor.
pub fn extract_file(path: impl AsRef<Path>) -> Result<SourceUnit> {
    Extractor::new()?.extract_file(path.as_ref())
}

/// Extract a file or directory tree with the default extractor.
pub fn extract_tree(root: impl AsRef<Path>) -> Result<Vec<SourceUnit>> {
    Ok(Extractor::new()?.extract_tree(root.as_ref()))
}
