//! Commands dispatched from the HTTP API to the node event loop.

use mises_core::{
    MsgCreateDidRegistry, MsgCreateDidRegistryResponse, MsgUpdateAppInfo, MsgUpdateUserInfo,
    MsgUpdateUserRelation, QueryAppRequest, QueryAppResponse, QueryDidRequest, QueryDidResponse,
    QueryUserRelationRequest, QueryUserRelationResponse, QueryUserRequest, QueryUserResponse,
};
use mises_identity::IdentityError;
use tokio::sync::oneshot;

pub type Reply<T> = oneshot::Sender<Result<T, IdentityError>>;

/// A command sent from the HTTP API to the node's main event loop.
pub enum NodeCommand {
    /// Register a DID.
    CreateDidRegistry {
        msg: MsgCreateDidRegistry,
        reply: Reply<MsgCreateDidRegistryResponse>,
    },
    UpdateUserInfo {
        msg: MsgUpdateUserInfo,
        reply: Reply<()>,
    },
    UpdateAppInfo {
        msg: MsgUpdateAppInfo,
        reply: Reply<()>,
    },
    /// Follow, unfollow, block or unblock.
    UpdateUserRelation {
        msg: MsgUpdateUserRelation,
        reply: Reply<()>,
    },
    QueryDid {
        req: QueryDidRequest,
        reply: Reply<QueryDidResponse>,
    },
    QueryUser {
        req: QueryUserRequest,
        reply: Reply<QueryUserResponse>,
    },
    QueryApp {
        req: QueryAppRequest,
        reply: Reply<QueryAppResponse>,
    },
    QueryUserRelation {
        req: QueryUserRelationRequest,
        reply: Reply<QueryUserRelationResponse>,
    },
}

impl NodeCommand {
    /// Whether the command writes state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreateDidRegistry { .. }
                | Self::UpdateUserInfo { .. }
                | Self::UpdateAppInfo { .. }
                | Self::UpdateUserRelation { .. }
        )
    }
}
