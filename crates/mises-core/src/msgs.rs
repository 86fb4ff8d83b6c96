//! Transaction messages and query envelopes exchanged with the RPC layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::records::{AppInfo, DidRegistry};
use crate::types::RelType;

/// Register a new DID together with its account and profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MsgCreateDidRegistry {
    pub creator: String,
    pub did: String,
    pub pkey_did: String,
    pub pkey_type: String,
    pub pkey_multibase: String,
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MsgCreateDidRegistryResponse {}

/// Overwrite the encrypted payload of a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MsgUpdateUserInfo {
    pub creator: String,
    pub uid: String,
    pub enc_data: String,
    pub iv: String,
    pub version: u64,
}

/// Overwrite the descriptive fields of an application profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MsgUpdateAppInfo {
    pub creator: String,
    pub appid: String,
    pub name: String,
    #[serde(default)]
    pub domains: Vec<String>,
    pub developer: String,
    pub home_url: String,
    pub icon_url: String,
    pub version: u64,
}

/// Change the relation bits on the edge `uid_from -> uid_to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateUserRelation {
    pub creator: String,
    pub uid_from: String,
    pub uid_to: String,
    pub action: RelationAction,
    #[serde(default)]
    pub version: u64,
}

/// Edit applied to a relation edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationAction {
    Follow,
    Unfollow,
    Block,
    Unblock,
}

impl RelationAction {
    /// The relation bit this action touches.
    pub fn bit(&self) -> u64 {
        match self {
            Self::Follow | Self::Unfollow => RelType::FOLLOW,
            Self::Block | Self::Unblock => RelType::BLOCK,
        }
    }

    /// Whether the action sets (`true`) or clears (`false`) its bit.
    pub fn sets_bit(&self) -> bool {
        matches!(self, Self::Follow | Self::Block)
    }

    /// Apply the action to an existing bitmask.
    pub fn apply(&self, rel_type: u64) -> u64 {
        if self.sets_bit() {
            rel_type | self.bit()
        } else {
            rel_type & !self.bit()
        }
    }
}

impl fmt::Display for RelationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Follow => write!(f, "follow"),
            Self::Unfollow => write!(f, "unfollow"),
            Self::Block => write!(f, "block"),
            Self::Unblock => write!(f, "unblock"),
        }
    }
}

impl FromStr for RelationAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "follow" => Ok(Self::Follow),
            "unfollow" => Ok(Self::Unfollow),
            "block" => Ok(Self::Block),
            "unblock" => Ok(Self::Unblock),
            other => Err(CoreError::UnknownRelationAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryDidRequest {
    pub mises_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryDidResponse {
    pub did_registry: DidRegistry,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryUserRequest {
    pub mises_id: String,
}

/// Publicly visible part of a user profile. Reserved; carries no fields yet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PublicUserInfo {}

/// Encrypted part of a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrivateUserInfo {
    pub enc_data: String,
    pub iv: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryUserResponse {
    pub pub_info: PublicUserInfo,
    pub pri_info: PrivateUserInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryAppRequest {
    pub mises_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryAppResponse {
    pub app_info: AppInfo,
}

/// Cursor-based page request. `key` is the last DID of the previous page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageResponse {
    pub next_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryUserRelationRequest {
    pub mises_id: String,
    /// `"following"` or empty.
    #[serde(default)]
    pub filter: String,
    #[serde(default)]
    pub pagination: Option<PageRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MisesId {
    pub mises_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryUserRelationResponse {
    pub mises_list: Vec<MisesId>,
    pub pagination: PageResponse,
}
