use crate::errors::StoreError;
use crate::types::{ClassificationRecord, NewClassification};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Persistence boundary for classification records.
pub trait ClassificationStore: Send + Sync {
    /// Stores `new`, assigning the next id and the current time.
    fn save(&self, new: NewClassification) -> Result<ClassificationRecord, StoreError>;

    /// All records, newest first.
    fn list_recent(&self) -> Result<Vec<ClassificationRecord>, StoreError>;

    /// Records created in `[start, end]`, oldest first.
    fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ClassificationRecord>, StoreError>;

    fn count(&self) -> Result<u64, StoreError>;

    /// Record count per predicted class, ordered by class name.
    fn count_by_class(&self) -> Result<Vec<(String, u64)>, StoreError>;

    fn delete(&self, id: u64) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

struct Inner {
    next_id: u64,
    records: BTreeMap<u64, ClassificationRecord>,
}

/// Process-local store. Ids increase monotonically and are never reused,
/// even after `clear`.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    clock: Clock,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                records: BTreeMap::new(),
            }),
            clock: Box::new(clock),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassificationStore for InMemoryStore {
    fn save(&self, new: NewClassification) -> Result<ClassificationRecord, StoreError> {
        let mut inner = self.write()?;
        // Stamped under the lock so id order and created_at order agree
        let created_at = (self.clock)();

        let id = inner.next_id;
        inner.next_id += 1;

        let record = ClassificationRecord {
            id,
            predicted_class: new.predicted_class,
            confidence: new.confidence,
            image_name: new.image_name,
            created_at,
            scores: new.scores,
        };
        inner.records.insert(id, record.clone());

        tracing::debug!(id, predicted_class = %record.predicted_class, "Classification saved");
        Ok(record)
    }

    fn list_recent(&self) -> Result<Vec<ClassificationRecord>, StoreError> {
        let mut records: Vec<_> = self.read()?.records.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ClassificationRecord>, StoreError> {
        let mut records: Vec<_> = self
            .read()?
            .records
            .values()
            .filter(|r| r.created_at >= start && r.created_at <= end)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    fn count(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.records.len() as u64)
    }

    fn count_by_class(&self) -> Result<Vec<(String, u64)>, StoreError> {
        let inner = self.read()?;
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for record in inner.records.values() {
            *counts.entry(record.predicted_class.as_str()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect())
    }

    fn delete(&self, id: u64) -> Result<(), StoreError> {
        self.write()?
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let removed = inner.records.len();
        inner.records.clear();
        tracing::info!(removed, "Classification history cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Clock that advances one hour per call
    fn ticking_store() -> InMemoryStore {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let ticks = Arc::new(AtomicI64::new(0));
        InMemoryStore::with_clock(move || {
            start + Duration::hours(ticks.fetch_add(1, Ordering::SeqCst))
        })
    }

    fn new(class: &str) -> NewClassification {
        NewClassification::new(class, 0.9, None, vec![(class.to_string(), 0.9)])
    }

    #[test]
    fn test_save_assigns_increasing_ids_and_timestamps() {
        let store = ticking_store();
        let first = store.save(new("glass")).unwrap();
        let second = store.save(new("metal")).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert!(second.created_at > first.created_at);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_list_recent_is_newest_first() {
        let store = ticking_store();
        for class in ["glass", "metal", "paper"] {
            store.save(new(class)).unwrap();
        }

        let classes: Vec<String> = store
            .list_recent()
            .unwrap()
            .into_iter()
            .map(|r| r.predicted_class)
            .collect();
        assert_eq!(classes, vec!["paper", "metal", "glass"]);
    }

    #[test]
    fn test_list_between_is_inclusive() {
        let store = ticking_store();
        for _ in 0..5 {
            store.save(new("trash")).unwrap();
        }

        let start = Utc.with_ymd_and_hms(2025, 1, 1, 1, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 1, 1, 3, 0, 0).unwrap();
        let ids: Vec<u64> = store
            .list_between(start, end)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_count_by_class_sorted_by_name() {
        let store = ticking_store();
        for class in ["plastic", "glass", "plastic", "cardboard", "plastic"] {
            store.save(new(class)).unwrap();
        }

        assert_eq!(
            store.count_by_class().unwrap(),
            vec![
                ("cardboard".to_string(), 1),
                ("glass".to_string(), 1),
                ("plastic".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_delete_missing_record_is_not_found() {
        let store = ticking_store();
        let saved = store.save(new("glass")).unwrap();

        store.delete(saved.id).unwrap();
        assert_eq!(store.delete(saved.id), Err(StoreError::NotFound(saved.id)));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_clear_keeps_id_sequence() {
        let store = ticking_store();
        store.save(new("glass")).unwrap();
        store.save(new("metal")).unwrap();

        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.list_recent().unwrap().is_empty());

        assert_eq!(store.save(new("paper")).unwrap().id, 3);
    }

    #[test]
    fn test_concurrent_saves_keep_ids_and_timestamps_in_step() {
        let store = Arc::new(ticking_store());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        store.save(new("glass")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut records = store.list_recent().unwrap();
        assert_eq!(records.len(), 200);
        records.sort_by_key(|r| r.id);
        for pair in records.windows(2) {
            assert!(
                pair[1].created_at > pair[0].created_at,
                "Record {} was stamped before record {}",
                pair[1].id,
                pair[0].id
            );
        }
    }
}
