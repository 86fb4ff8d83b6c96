/// Core type errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("invalid DID format: {0}")]
    InvalidDid(String),

    #[error("unsupported DID type: {0}")]
    UnsupportedDidType(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unknown relation action: {0}")]
    UnknownRelationAction(String),
}
