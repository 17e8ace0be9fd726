//! Result store backed by one JSON document.
//!
//! The document maps chapter ids to their latest result:
//! `{"<chapterId>": {"chapterId": ..., "score": ..., ...}}`. Reads are
//! tolerant: an unreadable document counts as empty and an unreadable
//! record is skipped, both with a warning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use lessonquiz_core::error::StoreError;
use lessonquiz_core::results::TestResult;
use lessonquiz_core::store::ResultStore;

pub struct JsonFileResultStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, TestResult>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        let raw: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "ignoring unreadable results file: {e}"
                );
                return Ok(BTreeMap::new());
            }
        };

        let mut results = BTreeMap::new();
        for (chapter_id, value) in raw {
            match serde_json::from_value::<TestResult>(value) {
                Ok(result) => {
                    results.insert(chapter_id, result);
                }
                Err(e) => tracing::warn!(chapter = %chapter_id, "ignoring unreadable result: {e}"),
            }
        }
        Ok(results)
    }

    fn write_all(&self, results: &BTreeMap<String, TestResult>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(results)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write then rename so a crash never leaves a half-written document.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ResultStore for JsonFileResultStore {
    fn save_test_result(&self, result: &TestResult) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut results = self.read_all()?;
        results.insert(result.chapter_id.clone(), result.clone());
        self.write_all(&results)?;
        tracing::info!(
            chapter = %result.chapter_id,
            path = %self.path.display(),
            "saved test result"
        );
        Ok(())
    }

    fn get_test_result(&self, chapter_id: &str) -> Result<Option<TestResult>, StoreError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(chapter_id))
    }

    fn all_results(&self) -> Result<BTreeMap<String, TestResult>, StoreError> {
        let _guard = self.lock.lock();
        self.read_all()
    }

    fn clear_test_result(&self, chapter_id: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut results = self.read_all()?;
        if results.remove(chapter_id).is_some() {
            self.write_all(&results)?;
        }
        Ok(())
    }

    fn clear_all_results(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
