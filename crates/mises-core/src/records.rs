//! Persisted record types.
//!
//! Field tags follow the chain's protobuf schema so stored bytes stay
//! compatible with other implementations of the module.

use serde::{Deserialize, Serialize};

/// Public key material registered for a DID.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct DidRegistry {
    #[prost(string, tag = "1")]
    pub creator: String,
    #[prost(uint64, tag = "2")]
    pub id: u64,
    #[prost(string, tag = "3")]
    pub did: String,
    #[prost(string, tag = "4")]
    pub pkey_did: String,
    #[prost(string, tag = "5")]
    pub pkey_type: String,
    /// Base58 encoded secp256k1 public key.
    #[prost(string, tag = "6")]
    pub pkey_multibase: String,
    #[prost(uint64, tag = "7")]
    pub version: u64,
}

/// Profile of a user DID. `enc_data` is encrypted client side.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct UserInfo {
    #[prost(string, tag = "1")]
    pub creator: String,
    #[prost(uint64, tag = "2")]
    pub id: u64,
    #[prost(string, tag = "3")]
    pub uid: String,
    #[prost(string, tag = "4")]
    pub enc_data: String,
    #[prost(string, tag = "5")]
    pub iv: String,
    #[prost(uint64, tag = "6")]
    pub version: u64,
}

/// Profile of an application DID.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct AppInfo {
    #[prost(string, tag = "1")]
    pub creator: String,
    #[prost(uint64, tag = "2")]
    pub id: u64,
    #[prost(string, tag = "3")]
    pub appid: String,
    #[prost(string, tag = "4")]
    pub name: String,
    #[prost(string, repeated, tag = "5")]
    pub domains: Vec<String>,
    #[prost(string, tag = "6")]
    pub developer: String,
    #[prost(string, tag = "7")]
    pub home_url: String,
    #[prost(string, tag = "8")]
    pub icon_url: String,
    #[prost(uint64, tag = "9")]
    pub version: u64,
}

/// Directed relation edge `uid_from -> uid_to`; `rel_type` is a
/// [`RelType`](crate::RelType) bitmask.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct UserRelation {
    #[prost(string, tag = "1")]
    pub creator: String,
    #[prost(uint64, tag = "2")]
    pub id: u64,
    #[prost(string, tag = "3")]
    pub uid_from: String,
    #[prost(string, tag = "4")]
    pub uid_to: String,
    #[prost(uint64, tag = "5")]
    pub rel_type: u64,
    #[prost(uint64, tag = "6")]
    pub version: u64,
}

/// Binds a DID to its registry record and its profile record.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct MisesAccount {
    #[prost(string, tag = "1")]
    pub mises_id: String,
    #[prost(uint64, tag = "2")]
    pub did_registry_id: u64,
    /// Id of the `UserInfo` or `AppInfo` record, depending on `did_type`.
    #[prost(uint64, tag = "3")]
    pub info_id: u64,
    #[prost(string, tag = "4")]
    pub did_type: String,
}

/// Compressed secp256k1 public key (33 bytes).
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
pub struct PubKey {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct BaseAccount {
    /// Hex encoded [`AccAddress`](crate::AccAddress).
    #[prost(string, tag = "1")]
    pub address: String,
    #[prost(message, optional, tag = "2")]
    pub pub_key: Option<PubKey>,
    #[prost(uint64, tag = "3")]
    pub account_number: u64,
    #[prost(uint64, tag = "4")]
    pub sequence: u64,
}

/// Account owned by a chain module rather than a key holder.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct ModuleAccount {
    #[prost(message, optional, tag = "1")]
    pub base_account: Option<BaseAccount>,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, repeated, tag = "3")]
    pub permissions: Vec<String>,
}

/// Envelope persisted by the account ledger.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct StoredAccount {
    #[prost(oneof = "stored_account::Account", tags = "1, 2")]
    pub account: Option<stored_account::Account>,
}

pub mod stored_account {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Account {
        #[prost(message, tag = "1")]
        Base(super::BaseAccount),
        #[prost(message, tag = "2")]
        Module(super::ModuleAccount),
    }
}
