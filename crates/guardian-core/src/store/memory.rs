//! Keyed in-memory store of analysis payloads.
//!
//! Records are kept in write order: a store moves its id to the back, so the
//! front of the map is always the least recently written record. Without a
//! capacity the kernel grows without bound; long-running callers should
//! either set one or call [`MemoryKernel::clear`] periodically.

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::errors::GuardianResult;
use crate::models::{unix_timestamp, MemoryRecord, MemorySummary};

#[derive(Default)]
pub struct MemoryKernel {
    max_records: Option<usize>,
    records: Mutex<IndexMap<String, MemoryRecord>>,
}

impl MemoryKernel {
    /// Unbounded kernel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kernel that evicts the oldest-written records beyond `max_records`.
    pub fn with_capacity(max_records: usize) -> Self {
        Self {
            max_records: Some(max_records.max(1)),
            records: Mutex::new(IndexMap::new()),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.max_records
    }

    /// Store `data` under `id`, replacing any existing record.
    ///
    /// Returns the ids evicted to stay within capacity (always empty for an
    /// unbounded kernel).
    pub fn store<T: Serialize>(&self, id: &str, data: &T) -> GuardianResult<Vec<String>> {
        let payload = serde_json::to_value(data)?;
        let size = serde_json::to_vec(&payload)?.len();
        let record = MemoryRecord {
            payload,
            timestamp: unix_timestamp(),
            size,
        };

        let mut records = self.records.lock();
        records.shift_remove(id);
        records.insert(id.to_string(), record);

        let mut evicted = Vec::new();
        if let Some(max) = self.max_records {
            while records.len() > max {
                if let Some((old_id, _)) = records.shift_remove_index(0) {
                    evicted.push(old_id);
                }
            }
        }
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "memory kernel evicted records");
        }
        Ok(evicted)
    }

    /// Raw record, or `None` when nothing is stored under `id`.
    pub fn retrieve(&self, id: &str) -> Option<MemoryRecord> {
        self.records.lock().get(id).cloned()
    }

    /// Typed payload, or `Ok(None)` when nothing is stored under `id`.
    pub fn retrieve_as<T: DeserializeOwned>(&self, id: &str) -> GuardianResult<Option<T>> {
        match self.retrieve(id) {
            Some(record) => Ok(Some(serde_json::from_value(record.payload)?)),
            None => Ok(None),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.lock().contains_key(id)
    }

    /// Stored ids, least recently written first.
    pub fn list_ids(&self) -> Vec<String> {
        self.records.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Remove every record, or all but the `keep_last_n` most recently
    /// written. Returns the number removed.
    pub fn clear(&self, keep_last_n: Option<usize>) -> usize {
        self.clear_ids(keep_last_n).len()
    }

    /// Same as [`clear`](Self::clear) but returns the removed ids.
    pub fn clear_ids(&self, keep_last_n: Option<usize>) -> Vec<String> {
        let mut records = self.records.lock();
        let keep = keep_last_n.unwrap_or(0).min(records.len());
        let remove = records.len() - keep;
        let removed: Vec<String> = records.drain(..remove).map(|(id, _)| id).collect();
        debug!(removed = removed.len(), kept = keep, "memory kernel cleared");
        removed
    }

    pub fn summary(&self) -> MemorySummary {
        let records = self.records.lock();
        MemorySummary {
            total_records: records.len(),
            total_size: records.values().map(|r| r.size).sum(),
            latest_timestamp: records
                .values()
                .map(|r| r.timestamp)
                .fold(None, |acc: Option<f64>, ts| Some(acc.map_or(ts, |a| a.max(ts)))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        name: String,
        value: i64,
    }

    fn payload(name: &str, value: i64) -> Payload {
        Payload {
            name: name.to_string(),
            value,
        }
    }

    #[test]
    fn test_store_and_retrieve() {
        let kernel = MemoryKernel::new();
        kernel.store("a", &payload("a", 1)).unwrap();
        let got: Payload = kernel.retrieve_as("a").unwrap().unwrap();
        assert_eq!(got, payload("a", 1));
    }

    #[test]
    fn test_retrieve_unknown_is_none() {
        let kernel = MemoryKernel::new();
        assert!(kernel.retrieve("missing").is_none());
        let typed: Option<Payload> = kernel.retrieve_as("missing").unwrap();
        assert!(typed.is_none());
    }

    #[test]
    fn test_overwrite_keeps_single_record() {
        let kernel = MemoryKernel::new();
        kernel.store("a", &payload("first", 1)).unwrap();
        kernel.store("b", &payload("b", 2)).unwrap();
        kernel.store("a", &payload("second", 3)).unwrap();
        assert_eq!(kernel.len(), 2);
        let got: Payload = kernel.retrieve_as("a").unwrap().unwrap();
        assert_eq!(got, payload("second", 3));
        // Overwrite moves `a` to the most-recent end.
        assert_eq!(kernel.list_ids(), vec!["b", "a"]);
    }

    #[test]
    fn test_size_is_serialized_length() {
        let kernel = MemoryKernel::new();
        let data = payload("abc", 7);
        kernel.store("a", &data).unwrap();
        let expected = serde_json::to_string(&data).unwrap().len();
        assert_eq!(kernel.retrieve("a").unwrap().size, expected);
    }

    #[test]
    fn test_clear_all() {
        let kernel = MemoryKernel::new();
        for id in ["a", "b", "c"] {
            kernel.store(id, &payload(id, 0)).unwrap();
        }
        assert_eq!(kernel.clear(None), 3);
        assert!(kernel.is_empty());
        assert_eq!(kernel.clear(None), 0);
    }

    #[test]
    fn test_clear_keep_last_n() {
        let kernel = MemoryKernel::new();
        for id in ["a", "b", "c", "d"] {
            kernel.store(id, &payload(id, 0)).unwrap();
        }
        assert_eq!(kernel.clear_ids(Some(2)), vec!["a", "b"]);
        assert_eq!(kernel.list_ids(), vec!["c", "d"]);
        assert_eq!(kernel.clear(Some(10)), 0);
    }

    #[test]
    fn test_summary() {
        let kernel = MemoryKernel::new();
        assert_eq!(kernel.summary(), MemorySummary::default());

        kernel.store("a", &payload("a", 1)).unwrap();
        kernel.store("b", &payload("bb", 2)).unwrap();
        let summary = kernel.summary();
        let expected_size = kernel.retrieve("a").unwrap().size + kernel.retrieve("b").unwrap().size;
        assert_eq!(summary.total_records, 2);
        assert_eq!(summary.total_size, expected_size);
        assert_eq!(
            summary.latest_timestamp,
            Some(kernel.retrieve("b").unwrap().timestamp.max(kernel.retrieve("a").unwrap().timestamp))
        );
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let kernel = MemoryKernel::with_capacity(2);
        assert!(kernel.store("a", &payload("a", 0)).unwrap().is_empty());
        assert!(kernel.store("b", &payload("b", 0)).unwrap().is_empty());
        // Rewriting `a` makes `b` the oldest.
        assert!(kernel.store("a", &payload("a", 1)).unwrap().is_empty());
        assert_eq!(kernel.store("c", &payload("c", 0)).unwrap(), vec!["b"]);
        assert_eq!(kernel.list_ids(), vec!["a", "c"]);
        assert!(!kernel.contains("b"));
    }

    #[test]
    fn test_unbounded_by_default() {
        let kernel = MemoryKernel::new();
        assert_eq!(kernel.capacity(), None);
        for i in 0..500 {
            kernel.store(&format!("id-{i}"), &i).unwrap();
        }
        assert_eq!(kernel.len(), 500);
    }
}
