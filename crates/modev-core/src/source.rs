//! Notebook discovery.
//!
//! Finds notebook files under the notebooks directory and records the paths
//! the exporter needs: relative to the notebooks directory (for mirrored
//! output) and relative to the project root (for provenance comments).

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};

/// Extension of notebook files.
pub const NOTEBOOK_EXTENSION: &str = "py";

/// Package initializer, never exported.
const PACKAGE_INIT: &str = "__init__.py";

/// One notebook file found during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookSource {
    /// Path to the notebook file
    pub path: PathBuf,
    /// Path relative to the notebooks directory
    pub relative_path: PathBuf,
    /// Path relative to the project root, if the notebook is inside it
    pub project_path: Option<PathBuf>,
    /// Dotted module name (e.g. `nbs.core`)
    pub module_name: String,
}

impl NotebookSource {
    /// Describe a notebook found under `notebooks_dir`.
    ///
    /// # Errors
    /// Returns [`Error::Relativize`] if `path` is not inside `notebooks_dir`.
    pub fn new(path: &Path, notebooks_dir: &Path, project_root: &Path) -> Result<Self> {
        let relative_path = path
            .strip_prefix(notebooks_dir)
            .map_err(|_| Error::Relativize {
                path: path.to_path_buf(),
                root: notebooks_dir.to_path_buf(),
            })?
            .to_path_buf();

        let project_path = path.strip_prefix(project_root).ok().map(Path::to_path_buf);
        let module_name = module_name(project_path.as_deref().unwrap_or(&relative_path));

        Ok(Self {
            path: path.to_path_buf(),
            relative_path,
            project_path,
            module_name,
        })
    }

    /// Project-relative path with `/` separators on every platform.
    pub fn display_path(&self) -> Option<String> {
        self.project_path.as_deref().map(slash_path)
    }

    /// Whether this is a package initializer (`__init__.py`).
    pub fn is_package_init(&self) -> bool {
        self.path
            .file_name()
            .is_some_and(|name| name == PACKAGE_INIT)
    }
}

/// Join path components with `/`.
pub fn slash_path(path: &Path) -> String {
    path.iter()
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Dotted module name for a relative notebook path.
fn module_name(relative: &Path) -> String {
    relative
        .with_extension("")
        .iter()
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(".")
}

/// Directories that never hold notebooks.
fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || name == "__pycache__")
}

/// Find all notebook files under `notebooks_dir`, recursively.
///
/// Results are sorted by path so runs process notebooks in a stable order.
/// Entries that cannot be read are logged and skipped.
pub fn discover(notebooks_dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(notebooks_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry under {}: {}", notebooks_dir.display(), e);
                continue;
            }
        };

        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == NOTEBOOK_EXTENSION)
        {
            files.push(entry.into_path());
        }
    }

    files
}
