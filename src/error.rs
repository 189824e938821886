//! Error types for extraction and docstring insertion.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias used by the extraction and insertion engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the core engine.
///
/// Extraction failures are per file, insertion failures are per function.
/// Generation failures live in [`crate::generate::GenerationError`].
#[derive(Error, Debug)]
pub enum Error {
    /// The file could not be read or written.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid UTF-8.
    #[error("{} is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },

    /// The source does not parse as Python.
    #[error("syntax error in {} at line {line}, column {column}", path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        column: usize,
    },

    /// No definition with the requested name exists in the file.
    #[error("function {function:?} not found in {}", path.display())]
    NotFound { path: PathBuf, function: String },

    /// The edited source failed verification; the file was left untouched.
    #[error("edit of {function:?} in {} would corrupt the file: {reason}", path.display())]
    Corruption {
        path: PathBuf,
        function: String,
        reason: String,
    },

    /// The bundled Python grammar or one of its queries failed to load.
    #[error("python grammar unavailable: {0}")]
    Grammar(String),
}

impl Error {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether this is one of the parse failures (syntax or encoding).
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Error::Syntax { .. } | Error::Encoding { .. })
    }

    /// The file the error refers to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::Io { path, .. }
            | Error::Encoding { path }
            | Error::Syntax { path, .. }
            | Error::NotFound { path, .. }
            | Error::Corruption { path, .. } => Some(path),
            Error::Grammar(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::NotFound {
            path: PathBuf::from("pkg/mod.py"),
            function: "add".to_string(),
        };
        assert_eq!(err.to_string(), "function \"add\" not found in pkg/mod.py");
        assert!(!err.is_parse_error());

        let err = Error::Syntax {
            path: PathBuf::from("bad.py"),
            line: 3,
            column: 7,
        };
        assert!(err.is_parse_error());
        assert_eq!(err.path(), Some(Path::new("bad.py")));
        assert!(err.to_string().contains("line 3, column 7"));
    }
}
