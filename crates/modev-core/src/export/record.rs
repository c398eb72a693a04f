//! Outputs written during one export run.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

/// Output paths written this run, mapped to the notebook that produced each.
///
/// Every write is recorded, whether its path came from a directive or
/// mirrors the notebook location.
#[derive(Debug, Default)]
pub struct WriteRecord {
    written: FxHashMap<PathBuf, PathBuf>,
}

impl WriteRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notebook that already produced `output` this run.
    pub fn producer(&self, output: &Path) -> Option<&Path> {
        self.written.get(output).map(PathBuf::as_path)
    }

    /// Record a write, returning the notebook it replaced, if any.
    pub fn record(&mut self, output: PathBuf, notebook: PathBuf) -> Option<PathBuf> {
        self.written.insert(output, notebook)
    }

    pub fn len(&self) -> usize {
        self.written.len()
    }

    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tracks_last_producer() {
        let mut record = WriteRecord::new();
        let out = PathBuf::from("/src/pkg/shared.py");

        assert!(record.producer(&out).is_none());
        assert!(record.record(out.clone(), PathBuf::from("a.py")).is_none());
        assert_eq!(record.producer(&out), Some(Path::new("a.py")));

        let previous = record.record(out.clone(), PathBuf::from("b.py"));
        assert_eq!(previous, Some(PathBuf::from("a.py")));
        assert_eq!(record.producer(&out), Some(Path::new("b.py")));
        assert_eq!(record.len(), 1);
    }
}
