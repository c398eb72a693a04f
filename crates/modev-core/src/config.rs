//! Project configuration.
//!
//! Settings come from an optional `modev.yaml` at the project root. The
//! default export directory is named after the project, read from
//! `pyproject.toml` when present.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::export::TagStyle;

/// Name of the configuration file at the project root.
pub const CONFIG_FILE: &str = "modev.yaml";

/// Python project metadata, used to locate the project and name the package.
pub const PYPROJECT_FILE: &str = "pyproject.toml";

/// Notebooks directory when none is configured.
pub const DEFAULT_NOTEBOOKS_DIR: &str = "nbs";

/// Contents of `modev.yaml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notebooks_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_style: Option<TagStyle>,
}

impl ConfigFile {
    /// Read a config file.
    ///
    /// Returns `Ok(None)` if the file does not exist. An empty file is
    /// equivalent to one with no keys.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Some(Self::default()));
        }

        serde_yaml_ng::from_str(&content)
            .map(Some)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Starter configuration written by `modev init`.
    pub fn default_yaml(project_name: &str) -> Result<String> {
        let file = Self {
            notebooks_dir: Some(PathBuf::from(DEFAULT_NOTEBOOKS_DIR)),
            export_dir: Some(default_export_dir(project_name)),
            tag_style: Some(TagStyle::default()),
        };

        serde_yaml_ng::to_string(&file).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Values that take precedence over `modev.yaml`, e.g. from the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub notebooks_dir: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
}

/// Resolved settings for an export run. All paths are absolute when the
/// project root is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Base for provenance paths
    pub project_root: PathBuf,
    /// Directory searched for notebooks
    pub notebooks_dir: PathBuf,
    /// Directory receiving generated modules
    pub export_dir: PathBuf,
    /// Marker syntax recognised in cells
    pub tag_style: TagStyle,
}

impl ExportConfig {
    /// Create a config from explicit directories, with the default tag style.
    pub fn new(
        project_root: impl Into<PathBuf>,
        notebooks_dir: impl Into<PathBuf>,
        export_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            notebooks_dir: notebooks_dir.into(),
            export_dir: export_dir.into(),
            tag_style: TagStyle::default(),
        }
    }

    pub fn with_tag_style(mut self, tag_style: TagStyle) -> Self {
        self.tag_style = tag_style;
        self
    }

    /// Load the configuration for a project.
    pub fn load(project_root: &Path) -> Self {
        Self::load_with(project_root, &ConfigOverrides::default())
    }

    /// Load the configuration, letting `overrides` win over the file.
    ///
    /// A missing or unreadable `modev.yaml` falls back to defaults.
    pub fn load_with(project_root: &Path, overrides: &ConfigOverrides) -> Self {
        let config_path = project_root.join(CONFIG_FILE);
        let file = match ConfigFile::read(&config_path) {
            Ok(Some(file)) => {
                tracing::info!("loaded configuration from {}", config_path.display());
                file
            }
            Ok(None) => {
                tracing::info!("no {} found, using defaults", CONFIG_FILE);
                ConfigFile::default()
            }
            Err(e) => {
                tracing::warn!("ignoring invalid configuration: {}", e);
                ConfigFile::default()
            }
        };

        let notebooks_dir = overrides
            .notebooks_dir
            .clone()
            .or(file.notebooks_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_NOTEBOOKS_DIR));
        let export_dir = overrides
            .export_dir
            .clone()
            .or(file.export_dir)
            .unwrap_or_else(|| default_export_dir(&project_name(project_root)));

        let config = Self {
            project_root: project_root.to_path_buf(),
            notebooks_dir: project_root.join(notebooks_dir),
            export_dir: project_root.join(export_dir),
            tag_style: file.tag_style.unwrap_or_default(),
        };

        tracing::debug!(
            notebooks_dir = %config.notebooks_dir.display(),
            export_dir = %config.export_dir.display(),
            tag_style = %config.tag_style,
            "resolved configuration"
        );
        config
    }
}

/// `src/<project-name>`, with the name used unchanged.
fn default_export_dir(project_name: &str) -> PathBuf {
    Path::new("src").join(project_name)
}

#[derive(Deserialize)]
struct PyProject {
    project: Option<ProjectTable>,
}

#[derive(Deserialize)]
struct ProjectTable {
    name: Option<String>,
}

/// Project name from `pyproject.toml`, else the project directory name.
pub fn project_name(project_root: &Path) -> String {
    let pyproject = project_root.join(PYPROJECT_FILE);
    let from_pyproject = fs::read_to_string(&pyproject)
        .ok()
        .and_then(|content| match toml::from_str::<PyProject>(&content) {
            Ok(parsed) => parsed.project.and_then(|project| project.name),
            Err(e) => {
                tracing::warn!("could not parse {}: {}", pyproject.display(), e);
                None
            }
        });

    from_pyproject.unwrap_or_else(|| {
        project_root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string())
    })
}

/// Find the project root by walking up from `start`.
///
/// The root is the nearest directory holding `modev.yaml` or
/// `pyproject.toml`. Falls back to `start` when neither is found.
pub fn find_project_root(start: &Path) -> PathBuf {
    let found = start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE).is_file() || dir.join(PYPROJECT_FILE).is_file());

    match found {
        Some(dir) => dir.to_path_buf(),
        None => {
            tracing::warn!(
                "no {} or {} found above {}, using it as the project root",
                CONFIG_FILE,
                PYPROJECT_FILE,
                start.display()
            );
            start.to_path_buf()
        }
    }
}

/// What `init_project` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub config_path: PathBuf,
    pub config_created: bool,
    pub notebooks_dir: PathBuf,
    pub notebooks_created: bool,
}

/// Set up a project: write a starter `modev.yaml` and create the notebooks
/// directory. Existing files are left untouched.
pub fn init_project(project_root: &Path) -> Result<InitReport> {
    let config_path = project_root.join(CONFIG_FILE);
    let config_created = !config_path.exists();
    if config_created {
        let yaml = ConfigFile::default_yaml(&project_name(project_root))?;
        fs::write(&config_path, yaml)?;
        tracing::info!("wrote {}", config_path.display());
    }

    let notebooks_dir = ExportConfig::load(project_root).notebooks_dir;
    let notebooks_created = !notebooks_dir.is_dir();
    if notebooks_created {
        fs::create_dir_all(&notebooks_dir)?;
    }

    Ok(InitReport {
        config_path,
        config_created,
        notebooks_dir,
        notebooks_created,
    })
}
