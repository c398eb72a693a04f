//! Export command implementation for modev CLI.
//!
//! Runs the export pipeline and reports progress on the terminal. Problems
//! with individual notebooks are reported and counted; only a missing
//! notebooks directory or an uncreatable export directory fails the command.

use std::path::Path;

use modev_core::{
    ConfigOverrides, Error, ExportCallback, ExportConfig, ExportWarning, Exporter,
    NotebookSource, RunSummary, Severity,
};

use crate::colors;

/// Export every notebook in the project at `root`.
pub fn execute(root: &Path, overrides: &ConfigOverrides) -> anyhow::Result<()> {
    let config = ExportConfig::load_with(root, overrides);
    print_header(&config);

    let exporter = Exporter::new(config);
    let summary = exporter.run(&TerminalReporter)?;

    print_summary(&summary);
    Ok(())
}

/// Prints export progress as it happens.
struct TerminalReporter;

impl ExportCallback for TerminalReporter {
    fn on_discovered(&self, notebooks_dir: &Path, count: usize) {
        if count == 0 {
            println!(
                "{}No notebooks found in {}{}",
                colors::YELLOW,
                notebooks_dir.display(),
                colors::RESET
            );
        }
    }

    fn on_notebook_started(&self, source: &NotebookSource) {
        println!(
            "\n{}Processing{} {}",
            colors::BOLD,
            colors::RESET,
            source.relative_path.display()
        );
    }

    fn on_directive(&self, _source: &NotebookSource, filename: &str) {
        println!(
            "  {}→ default_exp {}{}",
            colors::DIM,
            filename,
            colors::RESET
        );
    }

    fn on_warning(&self, warning: &ExportWarning) {
        match warning.severity() {
            Severity::Notice => {
                println!("  {}{}{}", colors::DIM, warning, colors::RESET)
            }
            Severity::Warning => {
                eprintln!("  {}⚠ {}{}", colors::YELLOW, warning, colors::RESET)
            }
        }
    }

    fn on_notebook_failed(&self, path: &Path, error: &Error) {
        eprintln!(
            "  {}✗ {}: {}{}",
            colors::RED,
            path.display(),
            error.with_hint(),
            colors::RESET
        );
    }

    fn on_written(&self, _source: &NotebookSource, output: &Path, cells: usize) {
        println!(
            "  {}✓ Wrote {} cells to {}{}",
            colors::GREEN,
            cells,
            output.display(),
            colors::RESET
        );
    }
}

fn print_header(config: &ExportConfig) {
    println!(
        "\n{}modev{} - Exporting {}{}{} → {}{}{}",
        colors::BOLD,
        colors::RESET,
        colors::CYAN,
        config.notebooks_dir.display(),
        colors::RESET,
        colors::CYAN,
        config.export_dir.display(),
        colors::RESET
    );
    println!("{}", "─".repeat(50));
}

fn print_summary(summary: &RunSummary) {
    println!("\n{}", "─".repeat(50));

    let color = if summary.failed > 0 {
        colors::YELLOW
    } else {
        colors::GREEN
    };
    println!(
        "{}Exported{} {} of {} notebooks ({} processed, {} skipped, {} failed)",
        color,
        colors::RESET,
        summary.exported,
        summary.discovered,
        summary.processed,
        summary.skipped,
        summary.failed
    );
}
