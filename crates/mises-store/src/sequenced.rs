use std::marker::PhantomData;

use mises_core::Record;
use prost::Message;

use crate::error::StoreError;
use crate::kv::{BatchOperation, KvStore};

/// Reserved key suffix holding the ASCII decimal counter. Never 8 bytes
/// long, so it cannot collide with a record key.
const COUNT_SUFFIX: &[u8] = b"count";

/// Big-endian encoding of a record id. Lexicographic key order equals
/// numeric id order.
pub fn id_bytes(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

/// Inverse of [`id_bytes`]. `None` unless `bz` is exactly 8 bytes.
pub fn id_from_bytes(bz: &[u8]) -> Option<u64> {
    let arr: [u8; 8] = bz.try_into().ok()?;
    Some(u64::from_be_bytes(arr))
}

/// Append-only table with auto-incrementing ids.
///
/// The counter is persisted next to the records and only ever grows:
/// removing a record leaves a gap and its id is never handed out again.
pub struct SequencedStore<T> {
    prefix: Vec<u8>,
    count_key: Vec<u8>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> SequencedStore<T> {
    /// Table in the record type's own namespace.
    pub fn new() -> Self {
        Self::with_namespace(T::NAMESPACE)
    }

    pub fn with_namespace(namespace: &str) -> Self {
        let prefix = namespace.as_bytes().to_vec();
        let mut count_key = prefix.clone();
        count_key.extend_from_slice(COUNT_SUFFIX);
        Self {
            prefix,
            count_key,
            _record: PhantomData,
        }
    }

    fn namespace(&self) -> String {
        String::from_utf8_lossy(&self.prefix).into_owned()
    }

    fn record_key(&self, id: u64) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.prefix.len() + 8);
        key.extend_from_slice(&self.prefix);
        key.extend_from_slice(&id_bytes(id));
        key
    }

    fn encode(record: &T) -> Vec<u8> {
        record.encode_to_vec()
    }

    fn decode(&self, id: u64, bytes: &[u8]) -> Result<T, StoreError> {
        T::decode(bytes).map_err(|e| {
            tracing::error!(namespace = %self.namespace(), id, error = %e, "stored record is corrupt");
            StoreError::DecodeCorruption {
                namespace: self.namespace(),
                key: id.to_string(),
                reason: e.to_string(),
            }
        })
    }

    /// Number of records ever appended. Zero if the counter was never written.
    pub fn count<S: KvStore + ?Sized>(&self, kv: &S) -> Result<u64, StoreError> {
        let Some(bz) = kv.get(&self.count_key)? else {
            return Ok(0);
        };
        std::str::from_utf8(&bz)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| {
                tracing::error!(namespace = %self.namespace(), "cannot decode count");
                StoreError::CounterCorruption {
                    namespace: self.namespace(),
                    raw: String::from_utf8_lossy(&bz).into_owned(),
                }
            })
    }

    /// Batch entry that overwrites the counter with `count`.
    fn set_count_op(&self, count: u64) -> BatchOperation {
        BatchOperation::put(self.count_key.clone(), count.to_string().into_bytes())
    }

    /// Store `record` under the next id and bump the counter. Both writes go
    /// out in one batch. Returns the assigned id.
    pub fn append<S: KvStore + ?Sized>(&self, kv: &mut S, mut record: T) -> Result<u64, StoreError> {
        let count = self.count(kv)?;
        record.set_id(count);

        kv.write_batch(vec![
            BatchOperation::put(self.record_key(count), Self::encode(&record)),
            self.set_count_op(count + 1),
        ])?;

        tracing::trace!(namespace = %self.namespace(), id = count, "record appended");
        Ok(count)
    }

    /// Overwrite the record stored at `record.id()`. The counter is untouched.
    pub fn set<S: KvStore + ?Sized>(&self, kv: &mut S, record: &T) -> Result<(), StoreError> {
        kv.set(&self.record_key(record.id()), &Self::encode(record))
    }

    /// The record at `id`, or `None` if it was never appended or was removed.
    pub fn get<S: KvStore + ?Sized>(&self, kv: &S, id: u64) -> Result<Option<T>, StoreError> {
        kv.get(&self.record_key(id))?
            .map(|bytes| self.decode(id, &bytes))
            .transpose()
    }

    pub fn has<S: KvStore + ?Sized>(&self, kv: &S, id: u64) -> Result<bool, StoreError> {
        kv.has(&self.record_key(id))
    }

    /// Delete the record at `id`. The id stays consumed.
    pub fn remove<S: KvStore + ?Sized>(&self, kv: &mut S, id: u64) -> Result<(), StoreError> {
        kv.delete(&self.record_key(id))
    }

    /// Every live record, ascending by id. Each call rescans the store.
    pub fn get_all<S: KvStore + ?Sized>(&self, kv: &S) -> Result<Vec<T>, StoreError> {
        let mut records = Vec::new();
        for (key, value) in kv.prefix_scan(&self.prefix)? {
            let Some(id) = id_from_bytes(&key[self.prefix.len()..]) else {
                // the counter key
                continue;
            };
            records.push(self.decode(id, &value)?);
        }
        Ok(records)
    }
}

impl<T: Record> Default for SequencedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
