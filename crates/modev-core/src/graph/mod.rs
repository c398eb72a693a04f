//! Cell graph for notebook files.
//!
//! This module provides:
//! - Cell parsing from marimo-style notebook files
//! - Dependency graph construction from cell parameters and returns
//! - Deterministic execution order
//! - Cycle detection with helpful error messages
//! - The loader seam the export pipeline consumes

mod loader;
mod parser;
mod types;

pub use loader::{LoadedNotebook, MarimoLoader, NotebookLoader};
pub use parser::AppParser;
pub use types::{Cell, CellGraph, CellId, Language};
