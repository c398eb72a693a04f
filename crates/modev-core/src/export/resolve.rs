//! Choosing the output path for an export unit.

use std::path::{Component, Path, PathBuf};

use super::extract::ExportUnit;

/// Output path for a unit.
///
/// A directive filename is placed under `export_root`; otherwise the
/// notebook's path below the notebooks directory is mirrored there. Root,
/// prefix and `..` components are dropped so output never leaves
/// `export_root`.
pub fn resolve(unit: &ExportUnit, export_root: &Path) -> PathBuf {
    let relative = match &unit.filename {
        Some(filename) => Path::new(filename),
        None => unit.notebook.as_path(),
    };

    let mut path = export_root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                tracing::debug!("dropping {:?} from output path {}", component, relative.display());
            }
        }
    }
    path
}
