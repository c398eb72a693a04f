//! Selecting exportable cells from a loaded notebook.

use std::collections::BTreeSet;
use std::path::PathBuf;

use super::directive::{TagStyle, has_directive_line, is_exportable};
use super::manifest::PublicManifest;
use crate::graph::{Cell, CellId, Language, LoadedNotebook};

/// A cell selected for export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportableCell {
    pub id: CellId,
    pub source: String,
    /// Defined names; `None` when the loader could not determine them
    pub defs: Option<BTreeSet<String>>,
}

impl From<&Cell> for ExportableCell {
    fn from(cell: &Cell) -> Self {
        Self {
            id: cell.id.clone(),
            source: cell.code.clone(),
            defs: cell.defs.clone(),
        }
    }
}

/// Exportable cells of a notebook, in execution order.
///
/// Order IDs with no matching cell are skipped.
pub fn extract(notebook: &LoadedNotebook, style: TagStyle) -> Vec<ExportableCell> {
    notebook
        .execution_order()
        .iter()
        .filter_map(|id| {
            let cell = notebook.cell(id);
            if cell.is_none() {
                tracing::debug!(cell = %id, "execution order names an unknown cell");
            }
            cell
        })
        .filter(|cell| is_exportable(&cell.code, cell.language, style))
        .map(ExportableCell::from)
        .collect()
}

/// The cell consulted for the `default_exp` directive.
///
/// This is the first Python cell in definition order that carries either
/// the export marker or a directive line. Later cells are never consulted.
pub fn directive_cell(notebook: &LoadedNotebook, style: TagStyle) -> Option<&Cell> {
    notebook.cells().iter().find(|cell| {
        cell.language == Language::Python
            && (is_exportable(&cell.code, cell.language, style)
                || has_directive_line(&cell.code, style))
    })
}

/// Everything extracted from one notebook for a single output file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportUnit {
    /// Notebook path relative to the notebooks directory
    pub notebook: PathBuf,
    /// Filename requested by a `default_exp` directive
    pub filename: Option<String>,
    /// Exported cells in execution order
    pub cells: Vec<ExportableCell>,
    /// Union of names defined by the exported cells
    pub definitions: BTreeSet<String>,
}

impl ExportUnit {
    /// Build a unit, or `None` when the notebook has nothing to export.
    pub fn new(
        notebook: PathBuf,
        cells: Vec<ExportableCell>,
        filename: Option<String>,
    ) -> Option<Self> {
        if cells.is_empty() {
            return None;
        }

        let definitions = cells
            .iter()
            .filter_map(|cell| cell.defs.as_ref())
            .flatten()
            .cloned()
            .collect();

        Some(Self {
            notebook,
            filename,
            cells,
            definitions,
        })
    }

    /// The `__all__` manifest for this unit's output file.
    pub fn manifest(&self) -> PublicManifest {
        PublicManifest::from_definitions(&self.definitions)
    }
}
