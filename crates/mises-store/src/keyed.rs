use std::marker::PhantomData;

use prost::Message;

use crate::error::StoreError;
use crate::kv::KvStore;

/// Table keyed by a caller-chosen string instead of a counter.
pub struct KeyedStore<T> {
    prefix: Vec<u8>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Message + Default> KeyedStore<T> {
    pub fn new(namespace: &str) -> Self {
        Self {
            prefix: namespace.as_bytes().to_vec(),
            _record: PhantomData,
        }
    }

    fn full_key(&self, key: &str) -> Vec<u8> {
        let mut full = Vec::with_capacity(self.prefix.len() + key.len());
        full.extend_from_slice(&self.prefix);
        full.extend_from_slice(key.as_bytes());
        full
    }

    fn decode(&self, key: &str, bytes: &[u8]) -> Result<T, StoreError> {
        T::decode(bytes).map_err(|e| {
            let namespace = String::from_utf8_lossy(&self.prefix).into_owned();
            tracing::error!(%namespace, key, error = %e, "stored record is corrupt");
            StoreError::DecodeCorruption {
                namespace,
                key: key.to_string(),
                reason: e.to_string(),
            }
        })
    }

    pub fn get<S: KvStore + ?Sized>(&self, kv: &S, key: &str) -> Result<Option<T>, StoreError> {
        kv.get(&self.full_key(key))?
            .map(|bytes| self.decode(key, &bytes))
            .transpose()
    }

    pub fn has<S: KvStore + ?Sized>(&self, kv: &S, key: &str) -> Result<bool, StoreError> {
        kv.has(&self.full_key(key))
    }

    pub fn set<S: KvStore + ?Sized>(&self, kv: &mut S, key: &str, value: &T) -> Result<(), StoreError> {
        kv.set(&self.full_key(key), &value.encode_to_vec())
    }

    pub fn remove<S: KvStore + ?Sized>(&self, kv: &mut S, key: &str) -> Result<(), StoreError> {
        kv.delete(&self.full_key(key))
    }

    /// Every entry, ascending by key.
    pub fn get_all<S: KvStore + ?Sized>(&self, kv: &S) -> Result<Vec<(String, T)>, StoreError> {
        kv.prefix_scan(&self.prefix)?
            .into_iter()
            .map(|(full, bytes)| {
                let key = String::from_utf8_lossy(&full[self.prefix.len()..]).into_owned();
                let value = self.decode(&key, &bytes)?;
                Ok((key, value))
            })
            .collect()
    }
}
