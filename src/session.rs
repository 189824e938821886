//! Per-run record of applied docstrings.
//!
//! The caller owns the session and threads it through its loop; nothing is
//! stored globally.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Functions the caller applied documentation to during this run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    applied: BTreeSet<(PathBuf, String)>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `qualified_name` in `path` as applied.
    #[must_use]
    pub fn record(mut self, path: impl AsRef<Path>, qualified_name: &str) -> Self {
        self.applied
            .insert((path.as_ref().to_path_buf(), qualified_name.to_string()));
        self
    }

    pub fn was_applied(&self, path: impl AsRef<Path>, qualified_name: &str) -> bool {
        self.applied
            .contains(&(path.as_ref().to_path_buf(), qualified_name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.applied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    /// Applied entries, ordered by path then name.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.applied
            .iter()
            .map(|(path, name)| (path.as_path(), name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_query() {
        let session = Session::new()
            .record("b.py", "run")
            .record("a.py", "Thing.run")
            .record("a.py", "Thing.run");
        assert_eq!(session.len(), 2);
        assert!(session.was_applied("a.py", "Thing.run"));
        assert!(!session.was_applied("a.py", "run"));
        let order: Vec<_> = session.iter().map(|(p, n)| format!("{}:{n}", p.display())).collect();
        assert_eq!(order, ["a.py:Thing.run", "b.py:run"]);
    }

    #[test]
    fn test_sessions_are_independent() {
        let first = Session::new().record("a.py", "f");
        let second = Session::new();
        assert!(first.was_applied("a.py", "f"));
        assert!(second.is_empty());
    }
}
