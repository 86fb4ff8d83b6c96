use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Scheme prefix shared by every Mises DID.
pub const DID_PREFIX: &str = "did:mises:";

/// Decentralized Identifier (DID) in the Mises protocol.
/// Format: `did:mises:<type>:<identifier>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// Parse a DID from its full URI string.
    pub fn new(uri: impl Into<String>) -> Result<Self, CoreError> {
        let uri = uri.into();
        if !uri.starts_with(DID_PREFIX) {
            return Err(CoreError::InvalidDid(format!(
                "DID must start with '{}', got: {}",
                DID_PREFIX, uri
            )));
        }
        let parts: Vec<&str> = uri.splitn(4, ':').collect();
        if parts.len() < 4 || parts[2].is_empty() || parts[3].is_empty() {
            return Err(CoreError::InvalidDid(format!(
                "DID must have format 'did:mises:<type>:<identifier>', got: {}",
                uri
            )));
        }
        if uri.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(CoreError::InvalidDid(format!(
                "DID must not contain whitespace or control characters: {:?}",
                uri
            )));
        }
        Ok(Self(uri))
    }

    /// Build a DID from its type segment and identifier.
    pub fn from_parts(kind: &str, identifier: &str) -> Result<Self, CoreError> {
        Self::new(format!("{}{}:{}", DID_PREFIX, kind, identifier))
    }

    /// Get the full DID URI.
    pub fn uri(&self) -> &str {
        &self.0
    }

    /// The type segment (`user`, `app`, ...).
    pub fn kind(&self) -> &str {
        self.0.split(':').nth(2).unwrap_or_default()
    }

    /// Everything after the type segment.
    pub fn identifier(&self) -> &str {
        self.0.splitn(4, ':').nth(3).unwrap_or_default()
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Did {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Did {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

/// Kind of identity a DID names. Selects which profile record is bound to
/// the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DidType {
    /// End user; profile is a `UserInfo`.
    User,
    /// Application; profile is an `AppInfo`.
    App,
}

impl DidType {
    /// Tag persisted in `MisesAccount::did_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::App => "app",
        }
    }
}

impl fmt::Display for DidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DidType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "app" => Ok(Self::App),
            other => Err(CoreError::UnsupportedDidType(other.to_string())),
        }
    }
}

/// Length in bytes of a chain account address.
pub const ADDRESS_LEN: usize = 20;

/// Chain account address (20 bytes, hex encoded when displayed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccAddress([u8; ADDRESS_LEN]);

impl AccAddress {
    /// Wrap raw address bytes.
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Hex encoding used in persisted account records.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for AccAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for AccAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidAddress(e.to_string()))?;
        let arr: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            CoreError::InvalidAddress(format!(
                "address must be {} bytes, got {}",
                ADDRESS_LEN,
                b.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl TryFrom<String> for AccAddress {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccAddress> for String {
    fn from(addr: AccAddress) -> Self {
        addr.to_hex()
    }
}

/// Relation bitmask between two DIDs.
///
/// Bits combine: an edge may be both a follow and a referral.
pub struct RelType;

impl RelType {
    /// Matches every non-empty relation.
    pub const ANY: u64 = 0;
    pub const FOLLOW: u64 = 1;
    pub const BLOCK: u64 = 1 << 1;
    pub const REFERRED_BY: u64 = 1 << 2;

    /// Map a query filter onto a relation mask. Only `following` is
    /// recognised; anything else means unfiltered.
    pub fn from_filter(filter: &str) -> u64 {
        match filter {
            "following" => Self::FOLLOW,
            _ => Self::ANY,
        }
    }
}
