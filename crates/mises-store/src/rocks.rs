//! RocksDB storage backend.

use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch,
    WriteOptions, DB,
};
use std::path::Path;

use crate::error::StoreError;
use crate::kv::{BatchOperation, KvStore, ScanResult};

/// Module state: records, counters, accounts.
pub const CF_STATE: &str = "state";
/// Node bookkeeping that is not part of module state.
pub const CF_META: &str = "meta";

/// RocksDB-backed store. `KvStore` operates on the `state` column family.
pub struct RocksStore {
    db: DB,
    sync_writes: bool,
}

impl RocksStore {
    /// Open or create a RocksDB database at the given path with column families.
    pub fn open(path: &Path, sync_writes: bool) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_STATE, Options::default()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;
        tracing::debug!(path = %path.display(), sync_writes, "rocksdb opened");

        Ok(Self { db, sync_writes })
    }

    fn cf(&self, cf_name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(cf_name)
            .ok_or_else(|| StoreError::ColumnFamilyNotFound(cf_name.to_string()))
    }

    fn write_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.sync_writes);
        opts
    }

    /// Get node metadata.
    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get_cf(self.cf(CF_META)?, key.as_bytes())?)
    }

    /// Commit state operations together with metadata updates in one
    /// RocksDB write batch.
    pub fn commit(
        &mut self,
        operations: Vec<BatchOperation>,
        meta: &[(&str, Vec<u8>)],
    ) -> Result<(), StoreError> {
        let state = self.cf(CF_STATE)?;
        let meta_cf = self.cf(CF_META)?;
        let mut batch = WriteBatch::default();

        for op in &operations {
            match op {
                BatchOperation::Put { key, value } => batch.put_cf(state, key, value),
                BatchOperation::Delete { key } => batch.delete_cf(state, key),
            }
        }
        for (key, value) in meta {
            batch.put_cf(meta_cf, key.as_bytes(), value);
        }

        self.db.write_opt(batch, &self.write_options())?;
        Ok(())
    }
}

impl KvStore for RocksStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get_cf(self.cf(CF_STATE)?, key)?)
    }

    fn has(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.db.get_pinned_cf(self.cf(CF_STATE)?, key)?.is_some())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db
            .put_cf_opt(self.cf(CF_STATE)?, key, value, &self.write_options())?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.db
            .delete_cf_opt(self.cf(CF_STATE)?, key, &self.write_options())?;
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, StoreError> {
        let iter = self.db.iterator_cf(
            self.cf(CF_STATE)?,
            IteratorMode::From(prefix, Direction::Forward),
        );

        let mut results = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }

    fn scan_from(
        &self,
        prefix: &[u8],
        start: &[u8],
        limit: usize,
    ) -> Result<ScanResult, StoreError> {
        let mut results = Vec::new();
        if limit == 0 {
            return Ok(results);
        }
        let from = if start < prefix { prefix } else { start };
        let iter = self.db.iterator_cf(
            self.cf(CF_STATE)?,
            IteratorMode::From(from, Direction::Forward),
        );

        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
            if results.len() >= limit {
                break;
            }
        }
        Ok(results)
    }

    fn write_batch(&mut self, operations: Vec<BatchOperation>) -> Result<(), StoreError> {
        self.commit(operations, &[])
    }
}
