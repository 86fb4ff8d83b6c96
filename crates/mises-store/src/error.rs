/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("column family '{0}' not found")]
    ColumnFamilyNotFound(String),

    #[error("corrupted record in '{namespace}' at key {key}: {reason}")]
    DecodeCorruption {
        namespace: String,
        key: String,
        reason: String,
    },

    #[error("cannot decode count in '{namespace}': {raw:?}")]
    CounterCorruption { namespace: String, raw: String },
}

impl StoreError {
    /// Persisted bytes could not be decoded. The store is corrupt and the
    /// caller must stop processing rather than continue on bad state.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::DecodeCorruption { .. } | Self::CounterCorruption { .. }
        )
    }
}

impl From<rocksdb::Error> for StoreError {
    fn from(e: rocksdb::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Backend(e.to_string())
    }
}
