//! Loading notebooks into cells plus an execution order.

use rustc_hash::FxHashMap;

use super::parser::AppParser;
use super::types::{Cell, CellGraph, CellId};
use crate::error::Result;
use crate::source::NotebookSource;

/// Source of cell graphs for the export pipeline.
///
/// Anything that can hand back cells (source text, language, definitions)
/// together with a dependency-consistent order satisfies the exporter.
pub trait NotebookLoader {
    /// Load one notebook.
    ///
    /// # Errors
    /// Returns an error if the notebook cannot be read, has no cell graph,
    /// or its cells cannot be ordered.
    fn load(&self, source: &NotebookSource) -> Result<LoadedNotebook>;
}

/// A notebook's cells and the order they execute in.
#[derive(Debug, Clone)]
pub struct LoadedNotebook {
    /// Cells in definition order
    cells: Vec<Cell>,
    /// Cell position by ID
    index: FxHashMap<CellId, usize>,
    /// Cell IDs in execution order
    execution_order: Vec<CellId>,
}

impl LoadedNotebook {
    /// Create from cells in definition order and an externally computed order.
    pub fn new(cells: Vec<Cell>, execution_order: Vec<CellId>) -> Self {
        let index = cells
            .iter()
            .enumerate()
            .map(|(position, cell)| (cell.id.clone(), position))
            .collect();

        Self {
            cells,
            index,
            execution_order,
        }
    }

    /// Create from a resolved graph, using its execution order.
    pub fn from_graph(graph: CellGraph) -> Result<Self> {
        let order = graph.execution_order()?;
        Ok(Self::new(graph.into_cells(), order))
    }

    /// Get all cells in definition order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Get a cell by ID.
    pub fn cell(&self, id: &CellId) -> Option<&Cell> {
        self.index.get(id).map(|&position| &self.cells[position])
    }

    /// Cell IDs in execution order.
    pub fn execution_order(&self) -> &[CellId] {
        &self.execution_order
    }
}

/// Loads marimo-style notebook files from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarimoLoader {
    parser: AppParser,
}

impl MarimoLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotebookLoader for MarimoLoader {
    fn load(&self, source: &NotebookSource) -> Result<LoadedNotebook> {
        tracing::debug!(module = %source.module_name, "loading notebook");

        let mut graph = CellGraph::new();
        for cell in self.parser.parse_file(&source.path)? {
            graph.add_cell(cell);
        }
        graph.resolve_dependencies()?;

        LoadedNotebook::from_graph(graph)
    }
}
