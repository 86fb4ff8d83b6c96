use mises_core::CoreError;
use mises_store::StoreError;

/// Identity-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid DID: {0}")]
    InvalidDid(String),

    #[error("unsupported DID type: {0}")]
    UnsupportedDidType(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("account creation failed: {0}")]
    AccountCreationFailed(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl IdentityError {
    /// Persisted state could not be decoded; processing must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_corruption())
    }

    pub(crate) fn not_registered(mises_id: &str) -> Self {
        Self::NotFound(format!("mises id {} not exists", mises_id))
    }
}

impl From<CoreError> for IdentityError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidDid(msg) => Self::InvalidDid(msg),
            CoreError::UnsupportedDidType(kind) => Self::UnsupportedDidType(kind),
            CoreError::InvalidAddress(msg) | CoreError::UnknownRelationAction(msg) => {
                Self::InvalidArgument(msg)
            }
        }
    }
}
