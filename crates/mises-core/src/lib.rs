//! Mises Core: fundamental types for the Mises identity module.
//!
//! Persisted records are protobuf messages (derived with `prost`) that also
//! serialize to JSON for the node's HTTP API.

pub mod error;
pub mod msgs;
pub mod record;
pub mod records;
pub mod types;

pub use error::CoreError;
pub use msgs::{
    MisesId, MsgCreateDidRegistry, MsgCreateDidRegistryResponse, MsgUpdateAppInfo,
    MsgUpdateUserInfo, MsgUpdateUserRelation, PageRequest, PageResponse, PrivateUserInfo,
    PublicUserInfo, QueryAppRequest, QueryAppResponse, QueryDidRequest, QueryDidResponse,
    QueryUserRelationRequest, QueryUserRelationResponse, QueryUserRequest, QueryUserResponse,
    RelationAction,
};
pub use record::Record;
pub use records::{
    AppInfo, BaseAccount, DidRegistry, MisesAccount, ModuleAccount, PubKey, StoredAccount,
    UserInfo, UserRelation,
};
pub use types::{AccAddress, Did, DidType, RelType};
