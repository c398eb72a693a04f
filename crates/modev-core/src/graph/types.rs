//! Types for the cell graph.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

const ID_ALPHABET: &[u8; 52] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Number of distinct four-letter ids.
const ID_SPACE: u64 = 52 * 52 * 52 * 52;

/// Multiplier coprime with `ID_SPACE`, so index → id is a bijection.
const ID_STRIDE: u64 = 1_000_003;

/// Unique identifier for a cell within a notebook.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(String);

impl CellId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the id for the cell at `index` in definition order.
    ///
    /// Ids are four letters long and unique for any realistic notebook. The
    /// mapping is fixed, so an unchanged file always yields the same ids.
    pub fn from_index(index: usize) -> Self {
        let mut n = (index as u64 % ID_SPACE) * ID_STRIDE % ID_SPACE;
        let mut id = String::with_capacity(4);
        for _ in 0..4 {
            id.push(char::from(ID_ALPHABET[(n % 52) as usize]));
            n /= 52;
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Language a cell is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Sql,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Sql => "sql",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single notebook cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Unique identifier
    pub id: CellId,
    /// Function name (`_` for anonymous cells)
    pub name: String,
    /// Source code of the cell, without the function wrapper
    pub code: String,
    /// Cell language
    pub language: Language,
    /// Names the cell defines; `None` when they could not be determined
    pub defs: Option<BTreeSet<String>>,
    /// Names the cell reads from other cells
    pub refs: Vec<String>,
}

impl Cell {
    /// Create an anonymous Python cell with no definitions or references.
    pub fn new(id: CellId, code: impl Into<String>) -> Self {
        Self {
            id,
            name: "_".to_string(),
            code: code.into(),
            language: Language::Python,
            defs: Some(BTreeSet::new()),
            refs: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_defs<I, S>(mut self, defs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.defs = Some(defs.into_iter().map(Into::into).collect());
        self
    }

    pub fn without_defs(mut self) -> Self {
        self.defs = None;
        self
    }

    pub fn with_refs<I, S>(mut self, refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.refs = refs.into_iter().map(Into::into).collect();
        self
    }

    /// Name used in messages: the function name, or the id for anonymous cells.
    pub fn label(&self) -> String {
        if self.name.is_empty() || self.name == "_" {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }
}

/// Dependency graph over the cells of one notebook.
pub struct CellGraph {
    /// The directed graph: edges go from producer to consumer
    graph: DiGraph<usize, ()>,
    /// Node index of each cell, by definition position
    nodes: Vec<NodeIndex>,
    /// Cells in definition order
    cells: Vec<Cell>,
    /// Defined name to producing cell position
    definers: FxHashMap<String, usize>,
}

impl CellGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            nodes: Vec::new(),
            cells: Vec::new(),
            definers: FxHashMap::default(),
        }
    }

    /// Add a cell to the graph (first pass: collect cells).
    pub fn add_cell(&mut self, cell: Cell) {
        let position = self.cells.len();
        self.nodes.push(self.graph.add_node(position));
        self.cells.push(cell);
    }

    /// Register definitions and build edges (second pass).
    pub fn resolve_dependencies(&mut self) -> Result<()> {
        self.definers.clear();
        for (position, cell) in self.cells.iter().enumerate() {
            for name in cell.defs.iter().flatten() {
                if let Some(&first) = self.definers.get(name) {
                    return Err(Error::MultipleDefinition {
                        name: name.clone(),
                        first: self.cells[first].label(),
                        second: cell.label(),
                    });
                }
                self.definers.insert(name.clone(), position);
            }
        }

        // Collect all edges to add (can't mutate graph while iterating cells)
        let mut edges_to_add = Vec::new();
        for (position, cell) in self.cells.iter().enumerate() {
            for name in &cell.refs {
                match self.definers.get(name) {
                    Some(&producer) if producer != position => {
                        edges_to_add.push((producer, position));
                    }
                    Some(_) => {}
                    None => {
                        return Err(Error::UnresolvedReference {
                            cell: cell.label(),
                            name: name.clone(),
                        });
                    }
                }
            }
        }

        for (producer, consumer) in edges_to_add {
            self.graph
                .update_edge(self.nodes[producer], self.nodes[consumer], ());
        }

        self.detect_cycles()
    }

    /// Detect cycles in the graph and return a helpful error message.
    fn detect_cycles(&self) -> Result<()> {
        use petgraph::algo::kosaraju_scc;

        for scc in kosaraju_scc(&self.graph) {
            if scc.len() > 1 {
                let mut positions: Vec<usize> = scc.iter().map(|&idx| self.graph[idx]).collect();
                positions.sort_unstable();
                let cycle_names: Vec<String> =
                    positions.iter().map(|&p| self.cells[p].label()).collect();

                return Err(Error::CyclicDependency(format!(
                    "{} → {}",
                    cycle_names.join(" → "),
                    cycle_names[0]
                )));
            }
        }

        Ok(())
    }

    /// Get cells in execution order.
    ///
    /// Every cell comes after the cells it references. Among cells that are
    /// ready at the same time, the one defined first runs first.
    pub fn execution_order(&self) -> Result<Vec<CellId>> {
        let mut in_degree: Vec<usize> = self
            .nodes
            .iter()
            .map(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .count()
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(position, _)| Reverse(position))
            .collect();

        let mut order = Vec::with_capacity(self.cells.len());
        while let Some(Reverse(position)) = ready.pop() {
            order.push(self.cells[position].id.clone());
            for neighbor in self
                .graph
                .neighbors_directed(self.nodes[position], Direction::Outgoing)
            {
                let consumer = self.graph[neighbor];
                in_degree[consumer] -= 1;
                if in_degree[consumer] == 0 {
                    ready.push(Reverse(consumer));
                }
            }
        }

        if order.len() != self.cells.len() {
            self.detect_cycles()?;
            return Err(Error::CyclicDependency(
                "cells could not be ordered".to_string(),
            ));
        }

        Ok(order)
    }

    /// Get all cells in definition order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Consume the graph, returning its cells in definition order.
    pub fn into_cells(self) -> Vec<Cell> {
        self.cells
    }

    /// Get the number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Default for CellGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_cell(index: usize, name: &str, deps: &[&str]) -> Cell {
        Cell::new(CellId::from_index(index), format!("{name} = 1"))
            .with_name(name)
            .with_defs([name])
            .with_refs(deps.iter().copied())
    }

    fn ordered_names(graph: &CellGraph) -> Vec<String> {
        let order = graph.execution_order().unwrap();
        order
            .iter()
            .map(|id| {
                graph
                    .cells()
                    .iter()
                    .find(|c| &c.id == id)
                    .unwrap()
                    .name
                    .clone()
            })
            .collect()
    }

    #[test]
    fn test_empty_graph() {
        let graph = CellGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
        assert!(graph.execution_order().unwrap().is_empty());
    }

    #[test]
    fn test_linear_dependencies() {
        let mut graph = CellGraph::new();
        graph.add_cell(make_cell(0, "a", &[]));
        graph.add_cell(make_cell(1, "b", &["a"]));
        graph.add_cell(make_cell(2, "c", &["b"]));
        graph.resolve_dependencies().unwrap();

        assert_eq!(ordered_names(&graph), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_forward_reference_runs_first() {
        let mut graph = CellGraph::new();
        graph.add_cell(make_cell(0, "uses_helper", &["helper"]));
        graph.add_cell(make_cell(1, "helper", &[]));
        graph.resolve_dependencies().unwrap();

        assert_eq!(ordered_names(&graph), vec!["helper", "uses_helper"]);
    }

    #[test]
    fn test_ties_follow_definition_order() {
        let mut graph = CellGraph::new();
        graph.add_cell(make_cell(0, "a", &[]));
        graph.add_cell(make_cell(1, "d", &["b", "c"]));
        graph.add_cell(make_cell(2, "c", &["a"]));
        graph.add_cell(make_cell(3, "b", &["a"]));
        graph.resolve_dependencies().unwrap();

        assert_eq!(ordered_names(&graph), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_cycle_detection() {
        let mut graph = CellGraph::new();
        graph.add_cell(make_cell(0, "a", &["c"]));
        graph.add_cell(make_cell(1, "b", &["a"]));
        graph.add_cell(make_cell(2, "c", &["b"]));

        let err = graph.resolve_dependencies().unwrap_err();
        match err {
            Error::CyclicDependency(msg) => assert_eq!(msg, "a → b → c → a"),
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_dependency() {
        let mut graph = CellGraph::new();
        graph.add_cell(make_cell(0, "a", &["nonexistent"]));

        let err = graph.resolve_dependencies().unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference { ref name, .. } if name == "nonexistent"));
    }

    #[test]
    fn test_multiple_definition() {
        let mut graph = CellGraph::new();
        graph.add_cell(make_cell(0, "a", &[]));
        graph.add_cell(Cell::new(CellId::from_index(1), "a = 2").with_defs(["a"]));

        let err = graph.resolve_dependencies().unwrap_err();
        assert!(matches!(err, Error::MultipleDefinition { ref name, .. } if name == "a"));
    }

    #[test]
    fn test_self_reference_is_ignored() {
        let mut graph = CellGraph::new();
        graph.add_cell(make_cell(0, "a", &["a"]));
        graph.resolve_dependencies().unwrap();
        assert_eq!(ordered_names(&graph), vec!["a"]);
    }

    #[test]
    fn test_cell_ids_are_stable_and_unique() {
        let ids: Vec<CellId> = (0..2000).map(CellId::from_index).collect();
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.iter().all(|id| id.as_str().len() == 4));
        assert!(ids.iter().all(|id| id.as_str().chars().all(|c| c.is_ascii_alphabetic())));
        assert_eq!(CellId::from_index(7), CellId::from_index(7));
    }

    #[test]
    fn test_label_falls_back_to_id() {
        let cell = Cell::new(CellId::new("Hbol"), "x = 1");
        assert_eq!(cell.label(), "Hbol");
        assert_eq!(cell.with_name("setup").label(), "setup");
    }
}
