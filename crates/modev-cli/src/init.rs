//! Init command implementation for modev CLI.

use std::path::Path;

use crate::colors;

/// Write a starter configuration and create the notebooks directory.
pub fn execute(root: &Path) -> anyhow::Result<()> {
    let report = modev_core::init_project(root)?;

    if report.config_created {
        println!(
            "{}Created{} {}",
            colors::GREEN,
            colors::RESET,
            report.config_path.display()
        );
    } else {
        println!(
            "{}Keeping existing{} {}",
            colors::DIM,
            colors::RESET,
            report.config_path.display()
        );
    }

    if report.notebooks_created {
        println!(
            "{}Created{} {}",
            colors::GREEN,
            colors::RESET,
            report.notebooks_dir.display()
        );
    }

    println!(
        "\nAdd marimo notebooks to {}{}{} and run {}modev export{}",
        colors::CYAN,
        report.notebooks_dir.display(),
        colors::RESET,
        colors::BOLD,
        colors::RESET
    );

    Ok(())
}
