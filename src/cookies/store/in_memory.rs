use std::sync::{Mutex, PoisonError};

use anyhow::Result;

use crate::cookies::store::DurableStore;

/// Durable store that only lives as long as the process. Used when no
/// persistence is wanted and in tests.
#[derive(Debug, Default)]
pub struct InMemoryDurableStore {
    records: Mutex<Vec<String>>,
}

impl InMemoryDurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `records`.
    pub fn with_records<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            records: Mutex::new(records.into_iter().map(Into::into).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DurableStore for InMemoryDurableStore {
    fn append(&self, record: &str) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.to_string());
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<String>> {
        Ok(self.records.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn clear(&self) -> Result<()> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clear();
        Ok(())
    }

    fn replace_all(&self, records: &[String]) -> Result<()> {
        *self.records.lock().unwrap_or_else(PoisonError::into_inner) = records.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_list_clear_contract() {
        let store = InMemoryDurableStore::new();
        assert!(store.list_all().unwrap().is_empty());

        store.append("A").unwrap();
        store.append("B").unwrap();
        assert_eq!(store.list_all().unwrap(), vec!["A", "B"]);

        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn replace_all_swaps_content() {
        let store = InMemoryDurableStore::with_records(["old1", "old2"]);
        store.replace_all(&["new".to_string()]).unwrap();
        assert_eq!(store.list_all().unwrap(), vec!["new"]);
    }
}
