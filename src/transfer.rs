use crate::clock::{Clock, date_key};
use crate::progress::{ProgressError, ProgressStore};
use crate::storage::KeyValueStore;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Export file name for the given day, e.g. `jit-progress-2024-03-05.json`
pub fn export_file_name(now_ms: i64) -> String {
    format!("jit-progress-{}.json", date_key(now_ms))
}

/// Write all progress as pretty JSON into `dir`, returning the file path
pub fn export_to_dir<S: KeyValueStore, C: Clock>(
    store: &ProgressStore<S, C>,
    dir: &Path,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;

    let path = dir.join(export_file_name(store.now_ms()));
    let json = store.export_json()?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write export: {}", path.display()))?;

    info!(path = %path.display(), entries = store.len(), "exported progress");
    Ok(path)
}

/// Replace all progress with the contents of a JSON file
pub fn import_from_file<S: KeyValueStore, C: Clock>(
    store: &mut ProgressStore<S, C>,
    path: &Path,
) -> Result<usize, ProgressError> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;

    store.import_json(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStore;
    use tempfile::TempDir;

    // 2024-03-05T12:00:00Z
    const NOW: i64 = 1_709_640_000_000;

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(NOW), "jit-progress-2024-03-05.json");
    }

    #[test]
    fn test_export_then_import() {
        let dir = TempDir::new().unwrap();
        let clock = FixedClock::at(NOW);

        let mut source = ProgressStore::open(MemoryStore::new(), &clock);
        source.record_grade("q1", 5).unwrap();
        source.record_grade("q2", 1).unwrap();
        let path = export_to_dir(&source, &dir.path().join("exports")).unwrap();
        assert!(path.ends_with("jit-progress-2024-03-05.json"));

        let mut target = ProgressStore::open(MemoryStore::new(), &clock);
        target.record_grade("other", 4).unwrap();
        assert_eq!(import_from_file(&mut target, &path).unwrap(), 2);
        assert_eq!(target.get_meta("q1"), source.get_meta("q1"));
        assert_eq!(target.get_meta("q2"), source.get_meta("q2"));
        assert_eq!(target.get_meta("other").reps, 0);
    }

    #[test]
    fn test_import_rejects_array_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let clock = FixedClock::at(NOW);
        let mut store = ProgressStore::open(MemoryStore::new(), &clock);
        let kept = store.record_grade("kept", 5).unwrap();

        let err = import_from_file(&mut store, &path).unwrap_err();
        assert!(matches!(err, ProgressError::NotAnObject(_)));
        assert_eq!(store.get_meta("kept"), kept);
    }

    #[test]
    fn test_import_missing_file() {
        let clock = FixedClock::at(NOW);
        let mut store = ProgressStore::open(MemoryStore::new(), &clock);
        let err = import_from_file(&mut store, Path::new("/nonexistent/progress.json")).unwrap_err();
        assert!(matches!(err, ProgressError::Storage(_)));
    }
}
