use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::kv::{BatchOperation, KvStore, ScanResult};

/// Write-buffering overlay over a parent store.
///
/// Reads observe buffered writes first and fall through to the parent.
/// Nothing reaches the parent until [`CacheStore::into_batch`] is handed to
/// the parent's `write_batch`; dropping the overlay discards every write.
pub struct CacheStore<'a, S: ?Sized> {
    parent: &'a S,
    /// `None` marks a buffered delete.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a, S: KvStore + ?Sized> CacheStore<'a, S> {
    pub fn new(parent: &'a S) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    /// Number of keys with a buffered write or delete.
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Consume the overlay, returning its writes as one batch in key order.
    pub fn into_batch(self) -> Vec<BatchOperation> {
        self.writes
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => BatchOperation::Put { key, value },
                None => BatchOperation::Delete { key },
            })
            .collect()
    }
}

impl<S: KvStore + ?Sized> KvStore for CacheStore<'_, S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.writes.get(key) {
            Some(buffered) => Ok(buffered.clone()),
            None => self.parent.get(key),
        }
    }

    fn has(&self, key: &[u8]) -> Result<bool, StoreError> {
        match self.writes.get(key) {
            Some(buffered) => Ok(buffered.is_some()),
            None => self.parent.has(key),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, StoreError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.prefix_scan(prefix)?.into_iter().collect();

        let overlay = self
            .writes
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix));
        for (key, value) in overlay {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged.into_iter().collect())
    }

    fn scan_from(
        &self,
        prefix: &[u8],
        start: &[u8],
        limit: usize,
    ) -> Result<ScanResult, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let from = if start < prefix { prefix } else { start };
        let overlay: Vec<_> = self
            .writes
            .range(from.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .collect();

        // Each buffered delete can hide at most one parent entry.
        let deletes = overlay.iter().filter(|(_, v)| v.is_none()).count();
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self
            .parent
            .scan_from(prefix, from, limit.saturating_add(deletes))?
            .into_iter()
            .collect();

        for (key, value) in overlay {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged.into_iter().take(limit).collect())
    }

    fn write_batch(&mut self, operations: Vec<BatchOperation>) -> Result<(), StoreError> {
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.writes.insert(key, Some(value));
                }
                BatchOperation::Delete { key } => {
                    self.writes.insert(key, None);
                }
            }
        }
        Ok(())
    }
}

/// Run `f` against a fresh overlay of `store` and commit its writes as a
/// single batch if it returns `Ok`. On `Err` nothing is written.
pub fn atomically<S, T, E, F>(store: &mut S, f: F) -> Result<T, E>
where
    S: KvStore + ?Sized,
    E: From<StoreError>,
    F: FnOnce(&mut CacheStore<'_, S>) -> Result<T, E>,
{
    let (value, batch) = {
        let mut tx = CacheStore::new(&*store);
        let value = f(&mut tx)?;
        (value, tx.into_batch())
    };
    if !batch.is_empty() {
        store.write_batch(batch)?;
    }
    Ok(value)
}
