//! Export orchestration across every notebook under the notebooks directory.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use super::assemble::{assemble, provenance_prefix};
use super::directive::{Directive, parse_directive};
use super::extract::{ExportUnit, directive_cell, extract};
use super::manifest::PublicManifest;
use super::record::WriteRecord;
use super::resolve::resolve;
use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::graph::{CellId, MarimoLoader, NotebookLoader};
use crate::source::{NotebookSource, discover};

/// How loudly a warning should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Expected in normal use, e.g. replacing output from a previous run.
    Notice,
    /// Likely a mistake in the notebooks or configuration.
    Warning,
}

/// Non-fatal conditions found while exporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportWarning {
    /// A `default_exp` directive without a filename.
    UnnamedDirective { notebook: PathBuf },
    /// An exported cell whose defined names are unknown.
    MissingDefinitions { notebook: PathBuf, cell: CellId },
    /// The notebook is outside the project root; provenance uses its absolute path.
    ProvenanceFallback { notebook: PathBuf },
    /// Another notebook already wrote this output during the run.
    Collision {
        output: PathBuf,
        previous: PathBuf,
        notebook: PathBuf,
    },
    /// The output existed before the run and is being replaced.
    Overwrite { output: PathBuf, notebook: PathBuf },
}

impl ExportWarning {
    pub fn severity(&self) -> Severity {
        match self {
            ExportWarning::Overwrite { .. } => Severity::Notice,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportWarning::UnnamedDirective { notebook } => write!(
                f,
                "found a default_exp directive but no filename in {}",
                notebook.display()
            ),
            ExportWarning::MissingDefinitions { notebook, cell } => write!(
                f,
                "cell {} in {} has no known definitions; its names are left out of __all__",
                cell,
                notebook.display()
            ),
            ExportWarning::ProvenanceFallback { notebook } => write!(
                f,
                "{} is not inside the project root; using its absolute path in origin comments",
                notebook.display()
            ),
            ExportWarning::Collision {
                output,
                previous,
                notebook,
            } => write!(
                f,
                "{} overwrites {}, already generated by {} in this run",
                notebook.display(),
                output.display(),
                previous.display()
            ),
            ExportWarning::Overwrite { output, notebook } => write!(
                f,
                "overwriting existing file {} from {}",
                output.display(),
                notebook.display()
            ),
        }
    }
}

/// Callback trait for export progress reporting.
pub trait ExportCallback {
    /// Called once notebook discovery is complete.
    fn on_discovered(&self, _notebooks_dir: &Path, _count: usize) {}

    /// Called before a notebook is loaded.
    fn on_notebook_started(&self, _source: &NotebookSource) {}

    /// Called when a notebook requests a specific output filename.
    fn on_directive(&self, _source: &NotebookSource, _filename: &str) {}

    /// Called for every non-fatal condition.
    fn on_warning(&self, warning: &ExportWarning);

    /// Called when a notebook could not be exported.
    fn on_notebook_failed(&self, path: &Path, error: &Error);

    /// Called after an output file is written.
    fn on_written(&self, _source: &NotebookSource, _output: &Path, _cells: usize) {}
}

/// Reports warnings and failures through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCallback;

impl ExportCallback for TracingCallback {
    fn on_warning(&self, warning: &ExportWarning) {
        match warning.severity() {
            Severity::Notice => tracing::info!("{}", warning),
            Severity::Warning => tracing::warn!("{}", warning),
        }
    }

    fn on_notebook_failed(&self, path: &Path, error: &Error) {
        tracing::error!("failed to export {}: {}", path.display(), error);
    }

    fn on_written(&self, _source: &NotebookSource, output: &Path, cells: usize) {
        tracing::info!("wrote {} ({} cells)", output.display(), cells);
    }
}

/// Counts from one export run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Notebook files found
    pub discovered: usize,
    /// Notebooks loaded successfully
    pub processed: usize,
    /// Output files written
    pub exported: usize,
    /// Notebooks with nothing to export, plus package initializers
    pub skipped: usize,
    /// Notebooks that failed to load or whose output failed to write
    pub failed: usize,
}

/// Drives the export of every notebook under the configured directory.
pub struct Exporter<L = MarimoLoader> {
    config: ExportConfig,
    loader: L,
}

impl Exporter<MarimoLoader> {
    /// Create an exporter that reads marimo notebooks from disk.
    pub fn new(config: ExportConfig) -> Self {
        Self::with_loader(config, MarimoLoader::new())
    }
}

impl<L: NotebookLoader> Exporter<L> {
    /// Create an exporter with a custom notebook loader.
    pub fn with_loader(config: ExportConfig, loader: L) -> Self {
        Self { config, loader }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export every notebook found under the notebooks directory.
    ///
    /// Problems with a single notebook or output file are reported through
    /// `callback` and counted; the run continues with the next notebook.
    ///
    /// # Errors
    /// Returns an error only if the notebooks directory is missing or the
    /// export directory cannot be created.
    pub fn run(&self, callback: &dyn ExportCallback) -> Result<RunSummary> {
        let notebooks_dir = &self.config.notebooks_dir;
        let export_dir = &self.config.export_dir;

        if !notebooks_dir.is_dir() {
            return Err(Error::NotebookRootMissing(notebooks_dir.clone()));
        }
        fs::create_dir_all(export_dir).map_err(|source| Error::ExportRoot {
            path: export_dir.clone(),
            source,
        })?;

        let files = discover(notebooks_dir);
        callback.on_discovered(notebooks_dir, files.len());

        let mut summary = RunSummary {
            discovered: files.len(),
            ..RunSummary::default()
        };
        let mut record = WriteRecord::new();

        for path in &files {
            let source =
                match NotebookSource::new(path, notebooks_dir, &self.config.project_root) {
                    Ok(source) => source,
                    Err(e) => {
                        summary.failed += 1;
                        callback.on_notebook_failed(path, &e);
                        continue;
                    }
                };

            if source.is_package_init() {
                tracing::debug!("skipping package initializer {}", path.display());
                summary.skipped += 1;
                continue;
            }

            callback.on_notebook_started(&source);
            match self.export_notebook(&source, &mut record, callback) {
                Ok(Some(_)) => {
                    summary.processed += 1;
                    summary.exported += 1;
                }
                Ok(None) => {
                    summary.processed += 1;
                    summary.skipped += 1;
                }
                Err(e) => {
                    if matches!(e, Error::Write { .. }) {
                        summary.processed += 1;
                    }
                    summary.failed += 1;
                    callback.on_notebook_failed(path, &e);
                }
            }
        }

        tracing::info!(
            discovered = summary.discovered,
            exported = summary.exported,
            failed = summary.failed,
            "export finished"
        );
        Ok(summary)
    }

    /// Export a single notebook.
    ///
    /// Returns the written path, or `None` when the notebook has nothing to
    /// export.
    pub fn export_notebook(
        &self,
        source: &NotebookSource,
        record: &mut WriteRecord,
        callback: &dyn ExportCallback,
    ) -> Result<Option<PathBuf>> {
        let style = self.config.tag_style;

        let unit = {
            let notebook = self.loader.load(source)?;
            let cells = extract(&notebook, style);

            let directive = directive_cell(&notebook, style)
                .map(|cell| parse_directive(&cell.code, style))
                .unwrap_or(Directive::Absent);
            match &directive {
                Directive::Target(filename) => callback.on_directive(source, filename),
                Directive::Unnamed => callback.on_warning(&ExportWarning::UnnamedDirective {
                    notebook: source.relative_path.clone(),
                }),
                Directive::Absent => {}
            }

            for cell in cells.iter().filter(|cell| cell.defs.is_none()) {
                callback.on_warning(&ExportWarning::MissingDefinitions {
                    notebook: source.relative_path.clone(),
                    cell: cell.id.clone(),
                });
            }

            ExportUnit::new(source.relative_path.clone(), cells, directive.into_filename())
        };

        let Some(unit) = unit else {
            tracing::debug!("no exportable cells in {}", source.path.display());
            return Ok(None);
        };

        let prefix = provenance_prefix(&self.provenance_path(source, callback));
        let code = assemble(&unit.cells, style, &prefix);
        if code.is_empty() {
            tracing::debug!("exported cells of {} are empty", source.path.display());
            return Ok(None);
        }

        let output = resolve(&unit, &self.config.export_dir);
        if let Some(previous) = record.producer(&output) {
            callback.on_warning(&ExportWarning::Collision {
                output: output.clone(),
                previous: previous.to_path_buf(),
                notebook: source.relative_path.clone(),
            });
        } else if output.exists() {
            callback.on_warning(&ExportWarning::Overwrite {
                output: output.clone(),
                notebook: source.relative_path.clone(),
            });
        }

        write_output(&output, &unit.manifest(), &code)?;
        record.record(output.clone(), source.relative_path.clone());
        callback.on_written(source, &output, unit.cells.len());

        Ok(Some(output))
    }

    /// Notebook path used in provenance comments.
    fn provenance_path(&self, source: &NotebookSource, callback: &dyn ExportCallback) -> String {
        source.display_path().unwrap_or_else(|| {
            callback.on_warning(&ExportWarning::ProvenanceFallback {
                notebook: source.path.clone(),
            });
            source.path.display().to_string()
        })
    }
}

/// Write a module: the manifest, a blank line, the code and a final newline.
///
/// Parent directories are created as needed.
pub fn write_output(path: &Path, manifest: &PublicManifest, code: &str) -> Result<()> {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, format!("{manifest}\n\n{code}\n"))
    };

    write().map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("wrote {}", path.display());
    Ok(())
}
