//! Error types for modev-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for modev-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in modev-core.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to parse notebook source.
    #[error("parse error: {0}")]
    Parse(String),

    /// The notebook file has no `app = marimo.App(...)` object.
    #[error("no marimo app found in {}", .0.display())]
    MissingApp(PathBuf),

    /// A cell references a name that no cell defines.
    #[error("cell '{cell}' references '{name}', but no cell defines it")]
    UnresolvedReference { cell: String, name: String },

    /// The same name is defined by more than one cell.
    #[error("'{name}' is defined by more than one cell ({first}, {second})")]
    MultipleDefinition {
        name: String,
        first: String,
        second: String,
    },

    /// Cyclic dependency detected in the cell graph.
    #[error("cyclic dependency detected: {0}")]
    CyclicDependency(String),

    /// A notebook path could not be made relative to its root.
    #[error("{} is not inside {}", .path.display(), .root.display())]
    Relativize { path: PathBuf, root: PathBuf },

    /// The notebooks directory is missing or not a directory.
    #[error("notebooks directory does not exist or is not a directory: {}", .0.display())]
    NotebookRootMissing(PathBuf),

    /// The export directory could not be created.
    #[error("could not create export directory {}: {source}", .path.display())]
    ExportRoot {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing an output file failed.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error aborts the whole export run.
    ///
    /// Everything else is scoped to a single notebook or output file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::NotebookRootMissing(_) | Error::ExportRoot { .. })
    }

    /// A suggestion for fixing the error, shown by the CLI.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::NotebookRootMissing(_) => {
                Some("run `modev init` or set `notebooks_dir` in modev.yaml")
            }
            Error::MissingApp(_) => Some("notebooks must declare `app = marimo.App()`"),
            Error::CyclicDependency(_) => Some("break the cycle so each name is defined once"),
            Error::Config(_) => Some("check the keys in modev.yaml"),
            _ => None,
        }
    }

    /// The error message followed by its hint, if any.
    pub fn with_hint(&self) -> String {
        match self.hint() {
            Some(hint) => format!("{self}\n  hint: {hint}"),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_kinds() {
        assert!(Error::NotebookRootMissing(PathBuf::from("nbs")).is_fatal());
        assert!(
            Error::ExportRoot {
                path: PathBuf::from("src/pkg"),
                source: std::io::Error::other("denied"),
            }
            .is_fatal()
        );
        assert!(!Error::Parse("bad".to_string()).is_fatal());
        assert!(!Error::MissingApp(PathBuf::from("nbs/a.py")).is_fatal());
    }

    #[test]
    fn test_messages_name_the_file() {
        let err = Error::Relativize {
            path: PathBuf::from("/elsewhere/a.py"),
            root: PathBuf::from("/project/nbs"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/elsewhere/a.py"));
        assert!(msg.contains("/project/nbs"));
    }

    #[test]
    fn test_hint_is_appended() {
        let err = Error::NotebookRootMissing(PathBuf::from("nbs"));
        assert!(err.with_hint().contains("hint: run `modev init`"));

        let plain = Error::Parse("bad".to_string());
        assert_eq!(plain.with_hint(), plain.to_string());
    }
}
