//! modev CLI - literate programming export for marimo notebooks.

mod colors;
mod export;
mod init;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "modev")]
#[command(about = "Tools for managing marimo notebooks and code export")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up modev.yaml and the notebooks directory
    Init {
        /// Project root (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Extract tagged cells from notebooks into Python modules
    Export {
        /// Project root (default: nearest directory with modev.yaml or pyproject.toml)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Notebooks directory, relative to the project root
        #[arg(long)]
        notebooks_dir: Option<PathBuf>,

        /// Export directory, relative to the project root
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Append recovery hints to modev-core errors
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(modev_err) = err.downcast_ref::<modev_core::Error>() {
            anyhow::anyhow!("{}", modev_err.with_hint())
        } else {
            err
        }
    };

    match cli.command {
        Commands::Init { root } => {
            let root = match root {
                Some(root) => absolute(&root)?,
                None => std::env::current_dir()?,
            };
            init::execute(&root).map_err(format_error)?;
        }

        Commands::Export {
            root,
            notebooks_dir,
            export_dir,
        } => {
            let root = match root {
                Some(root) => absolute(&root)?,
                None => modev_core::find_project_root(&std::env::current_dir()?),
            };
            let overrides = modev_core::ConfigOverrides {
                notebooks_dir,
                export_dir,
            };
            export::execute(&root, &overrides).map_err(format_error)?;
        }
    }

    Ok(())
}

/// Make a user-supplied path absolute without requiring it to exist.
fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}
