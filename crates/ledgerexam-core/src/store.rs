//! Result store implementations.
//!
//! [`JsonFileResultStore`] keeps the whole history as one compact JSON array,
//! rewritten on every append. [`MemoryResultStore`] is for tests and for
//! grading runs that should not touch disk.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StoreError;
use crate::results::ExamResult;
use crate::traits::ResultStore;

/// In-memory history.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    results: Mutex<Vec<ExamResult>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for MemoryResultStore {
    fn append_result(&self, result: &ExamResult) -> Result<(), StoreError> {
        self.results
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .push(result.clone());
        Ok(())
    }

    fn list_results(&self) -> Result<Vec<ExamResult>, StoreError> {
        Ok(self
            .results
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .clone())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.results.lock().map_err(|_| StoreError::Poisoned)?.clear();
        Ok(())
    }
}

/// History persisted as a JSON array in a single file.
///
/// A missing file reads as an empty history. Parent directories are created
/// on first write.
#[derive(Debug)]
pub struct JsonFileResultStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<ExamResult>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, results: &[ExamResult]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let json = serde_json::to_string(results)?;
        std::fs::write(&self.path, json).map_err(|e| StoreError::io(&self.path, e))
    }
}

impl ResultStore for JsonFileResultStore {
    fn append_result(&self, result: &ExamResult) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut results = self.read()?;
        results.push(result.clone());
        self.write(&results)?;
        tracing::debug!(path = %self.path.display(), count = results.len(), "result appended");
        Ok(())
    }

    fn list_results(&self) -> Result<Vec<ExamResult>, StoreError> {
        self.read()
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exam_id: u32, score: u32) -> ExamResult {
        ExamResult {
            exam_id,
            date: "2024-05-01T09:30:00.000Z".into(),
            score,
            answers: vec![],
            time_spent: 300,
        }
    }

    #[test]
    fn memory_store_appends_in_order() {
        let store = MemoryResultStore::new();
        store.append_result(&result(1, 10)).unwrap();
        store.append_result(&result(2, 20)).unwrap();
        let listed = store.list_results().unwrap();
        assert_eq!(listed, vec![result(1, 10), result(2, 20)]);

        store.clear().unwrap();
        assert!(store.list_results().unwrap().is_empty());
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileResultStore::new(dir.path().join("history.json"));
        assert!(store.list_results().unwrap().is_empty());
        store.clear().unwrap();
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");

        let store = JsonFileResultStore::new(&path);
        store.append_result(&result(6, 85)).unwrap();
        store.append_result(&result(7, 40)).unwrap();

        let reopened = JsonFileResultStore::new(&path);
        assert_eq!(
            reopened.list_results().unwrap(),
            vec![result(6, 85), result(7, 40)]
        );
    }

    #[test]
    fn file_store_writes_compact_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let store = JsonFileResultStore::new(&path);
        store.append_result(&result(6, 85)).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            raw,
            r#"[{"examId":6,"date":"2024-05-01T09:30:00.000Z","score":85,"answers":[],"timeSpent":300}]"#
        );
    }

    #[test]
    fn file_store_clear_removes_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let store = JsonFileResultStore::new(&path);
        store.append_result(&result(6, 85)).unwrap();
        store.clear().unwrap();
        assert!(!path.exists());
        assert!(store.list_results().unwrap().is_empty());
    }

    #[test]
    fn file_store_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = JsonFileResultStore::new(&path);
        assert!(matches!(store.list_results(), Err(StoreError::Json(_))));
    }
}
