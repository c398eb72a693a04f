//! Assembling exported cells into one module body.

use super::directive::TagStyle;
use super::extract::ExportableCell;
use crate::graph::CellId;

/// Comment prefix naming the notebook that code came from.
pub fn provenance_prefix(notebook_path: &str) -> String {
    format!("# Exported from {notebook_path}")
}

/// Full provenance comment for one cell.
pub fn provenance_line(prefix: &str, id: &CellId) -> String {
    format!("{prefix} (cell ID: {id})")
}

/// Join exported cells into a module body.
///
/// The first export marker in each cell becomes its provenance comment.
/// Cells are trimmed and separated by one blank line; a cell left with
/// nothing but its provenance comment is dropped.
pub fn assemble(cells: &[ExportableCell], style: TagStyle, prefix: &str) -> String {
    let marker = style.export_marker();
    let mut blocks: Vec<String> = Vec::with_capacity(cells.len());

    for cell in cells {
        let origin = provenance_line(prefix, &cell.id);
        let replaced = cell.source.replacen(marker, &origin, 1);
        let cleaned = replaced.trim();

        if cleaned.is_empty() || cleaned == origin {
            tracing::debug!(cell = %cell.id, "cell has no code besides its marker");
            continue;
        }

        if cleaned.starts_with(&origin) {
            blocks.push(cleaned.to_string());
        } else {
            blocks.push(format!("{origin}\n{cleaned}"));
        }
    }

    blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(id: &str, source: &str) -> ExportableCell {
        ExportableCell {
            id: CellId::new(id),
            source: source.to_string(),
            defs: None,
        }
    }

    const PREFIX: &str = "# Exported from nbs/core.py";

    #[test]
    fn test_marker_becomes_provenance() {
        let out = assemble(&[cell("Hbol", "#| export\nx = 1")], TagStyle::Pipe, PREFIX);
        assert_eq!(out, "# Exported from nbs/core.py (cell ID: Hbol)\nx = 1");
        assert!(!out.contains("#| export"));
    }

    #[test]
    fn test_cells_separated_by_one_blank_line() {
        let out = assemble(
            &[
                cell("a", "#| export\nx = 1\n\n\n"),
                cell("b", "\n#| export\ny = 2"),
            ],
            TagStyle::Pipe,
            PREFIX,
        );
        assert_eq!(
            out,
            "# Exported from nbs/core.py (cell ID: a)\nx = 1\n\n# Exported from nbs/core.py (cell ID: b)\ny = 2"
        );
    }

    #[test]
    fn test_marker_only_cell_is_dropped() {
        let out = assemble(
            &[cell("a", "  #| export  \n"), cell("b", "#| export\nz = 3")],
            TagStyle::Pipe,
            PREFIX,
        );
        assert_eq!(out, "# Exported from nbs/core.py (cell ID: b)\nz = 3");
    }

    #[test]
    fn test_code_before_marker_gets_leading_provenance() {
        let out = assemble(&[cell("a", "import os\n#| export\nx = 1")], TagStyle::Pipe, PREFIX);
        assert!(out.starts_with("# Exported from nbs/core.py (cell ID: a)\nimport os\n"));
    }

    #[test]
    fn test_only_first_marker_replaced() {
        let out = assemble(&[cell("a", "#| export\nx = 1\n#| export")], TagStyle::Pipe, PREFIX);
        assert_eq!(out.matches("(cell ID: a)").count(), 1);
        assert!(out.ends_with("#| export"));
    }

    #[test]
    fn test_heading_marker() {
        let out = assemble(&[cell("a", "## Export\nx = 1")], TagStyle::Heading, PREFIX);
        assert_eq!(out, "# Exported from nbs/core.py (cell ID: a)\nx = 1");
    }

    #[test]
    fn test_no_cells() {
        assert_eq!(assemble(&[], TagStyle::Pipe, PREFIX), "");
    }
}
