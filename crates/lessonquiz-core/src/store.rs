//! Result persistence seam.
//!
//! One record per chapter; saving again replaces the previous attempt.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::error::StoreError;
use crate::results::TestResult;

pub trait ResultStore: Send + Sync {
    /// Save a result, replacing any earlier one for the same chapter.
    fn save_test_result(&self, result: &TestResult) -> Result<(), StoreError>;

    fn get_test_result(&self, chapter_id: &str) -> Result<Option<TestResult>, StoreError>;

    /// Every stored result, keyed by chapter id.
    fn all_results(&self) -> Result<BTreeMap<String, TestResult>, StoreError>;

    fn clear_test_result(&self, chapter_id: &str) -> Result<(), StoreError>;

    fn clear_all_results(&self) -> Result<(), StoreError>;
}

/// Process-local store, used for previews and tests.
#[derive(Default)]
pub struct MemoryResultStore {
    results: Mutex<BTreeMap<String, TestResult>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for MemoryResultStore {
    fn save_test_result(&self, result: &TestResult) -> Result<(), StoreError> {
        self.results
            .lock()
            .insert(result.chapter_id.clone(), result.clone());
        Ok(())
    }

    fn get_test_result(&self, chapter_id: &str) -> Result<Option<TestResult>, StoreError> {
        Ok(self.results.lock().get(chapter_id).cloned())
    }

    fn all_results(&self) -> Result<BTreeMap<String, TestResult>, StoreError> {
        Ok(self.results.lock().clone())
    }

    fn clear_test_result(&self, chapter_id: &str) -> Result<(), StoreError> {
        self.results.lock().remove(chapter_id);
        Ok(())
    }

    fn clear_all_results(&self) -> Result<(), StoreError> {
        self.results.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(chapter_id: &str, correct_count: u32) -> TestResult {
        let mut result = TestResult::score(chapter_id, &[], |_| None);
        result.correct_count = correct_count;
        result
    }

    #[test]
    fn save_replaces_previous_attempt() {
        let store = MemoryResultStore::new();
        store.save_test_result(&result("ch1", 1)).unwrap();
        store.save_test_result(&result("ch1", 3)).unwrap();
        store.save_test_result(&result("ch2", 2)).unwrap();

        let ch1 = store.get_test_result("ch1").unwrap().unwrap();
        assert_eq!(ch1.correct_count, 3);
        assert_eq!(store.all_results().unwrap().len(), 2);
    }

    #[test]
    fn clearing() {
        let store = MemoryResultStore::new();
        store.save_test_result(&result("ch1", 1)).unwrap();
        store.save_test_result(&result("ch2", 1)).unwrap();

        store.clear_test_result("ch1").unwrap();
        assert!(store.get_test_result("ch1").unwrap().is_none());
        assert!(store.get_test_result("ch2").unwrap().is_some());

        store.clear_all_results().unwrap();
        assert!(store.all_results().unwrap().is_empty());
    }
}
