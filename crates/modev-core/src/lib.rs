//! Core engine for modev notebook export.
//!
//! This crate provides:
//! - Cell graph and dependency-ordered execution for marimo-style notebooks
//! - Notebook discovery under a notebooks directory
//! - Project configuration (`modev.yaml`, `pyproject.toml`)
//! - The export pipeline: directive parsing, cell extraction, code assembly,
//!   output resolution, `__all__` manifests and collision tracking

pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod source;

pub use config::{
    ConfigFile, ConfigOverrides, ExportConfig, InitReport, find_project_root, init_project,
};
pub use error::{Error, Result};
pub use export::{
    Directive, ExportCallback, ExportUnit, ExportWarning, ExportableCell, Exporter,
    PublicManifest, RunSummary, Severity, TracingCallback, TagStyle, WriteRecord,
};
pub use graph::{
    AppParser, Cell, CellGraph, CellId, Language, LoadedNotebook, MarimoLoader, NotebookLoader,
};
pub use source::{NotebookSource, discover};
