//! Read-only query surface.

use mises_core::{
    MisesId, PageResponse, PrivateUserInfo, PublicUserInfo, QueryAppRequest, QueryAppResponse,
    QueryDidRequest, QueryDidResponse, QueryUserRelationRequest, QueryUserRelationResponse,
    QueryUserRequest, QueryUserResponse, RelType,
};
use mises_store::KvStore;

use crate::account::AccountKeeper;
use crate::error::IdentityError;
use crate::keeper::Keeper;

impl<A: AccountKeeper> Keeper<A> {
    /// The DidRegistry record bound to `mises_id`.
    pub fn query_did<S: KvStore + ?Sized>(
        &self,
        kv: &S,
        req: &QueryDidRequest,
    ) -> Result<QueryDidResponse, IdentityError> {
        if req.mises_id.is_empty() {
            return Err(IdentityError::InvalidArgument("mises_id must not be empty".into()));
        }
        let account = self.require_account(kv, &req.mises_id)?;
        let did_registry = self
            .did_registries
            .get(kv, account.did_registry_id)?
            .ok_or_else(|| {
                IdentityError::NotFound(format!("did registry {}", account.did_registry_id))
            })?;
        Ok(QueryDidResponse { did_registry })
    }

    /// A user profile split into its public and encrypted halves.
    pub fn query_user<S: KvStore + ?Sized>(
        &self,
        kv: &S,
        req: &QueryUserRequest,
    ) -> Result<QueryUserResponse, IdentityError> {
        if req.mises_id.is_empty() {
            return Err(IdentityError::InvalidArgument("mises_id must not be empty".into()));
        }
        let account = self.require_account(kv, &req.mises_id)?;
        let info = self.user_info_of(kv, &account)?;
        Ok(QueryUserResponse {
            pub_info: PublicUserInfo {},
            pri_info: PrivateUserInfo {
                enc_data: info.enc_data,
                iv: info.iv,
            },
        })
    }

    pub fn query_app<S: KvStore + ?Sized>(
        &self,
        kv: &S,
        req: &QueryAppRequest,
    ) -> Result<QueryAppResponse, IdentityError> {
        if req.mises_id.is_empty() {
            return Err(IdentityError::InvalidArgument("mises_id must not be empty".into()));
        }
        let account = self.require_account(kv, &req.mises_id)?;
        let app_info = self.app_info_of(kv, &account)?;
        Ok(QueryAppResponse { app_info })
    }

    /// Target DIDs of `mises_id`'s outgoing relations.
    ///
    /// `filter == "following"` restricts to follow edges. A missing page or
    /// a zero limit uses the default page size; larger limits are capped.
    /// `next_key` is the last returned DID, or empty when nothing matched.
    pub fn query_user_relation<S: KvStore + ?Sized>(
        &self,
        kv: &S,
        req: &QueryUserRelationRequest,
    ) -> Result<QueryUserRelationResponse, IdentityError> {
        if req.mises_id.is_empty() {
            return Err(IdentityError::InvalidArgument("mises_id must not be empty".into()));
        }
        self.require_account(kv, &req.mises_id)?;

        let rel_type = RelType::from_filter(&req.filter);
        let (key, limit) = match &req.pagination {
            Some(page) => (page.key.as_str(), page.limit),
            None => ("", 0),
        };
        let limit = match limit {
            0 => self.params.default_page_limit,
            n => n.min(self.params.max_page_limit),
        };
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        let relations = self.get_user_relations(kv, rel_type, &req.mises_id, key, limit)?;
        let next_key = relations
            .last()
            .map(|r| r.uid_to.clone())
            .unwrap_or_default();
        let mises_list = relations
            .into_iter()
            .map(|r| MisesId { mises_id: r.uid_to })
            .collect();

        Ok(QueryUserRelationResponse {
            mises_list,
            pagination: PageResponse { next_key },
        })
    }
}
