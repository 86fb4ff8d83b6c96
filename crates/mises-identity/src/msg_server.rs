//! State-transition handlers.
//!
//! Every handler runs its writes in a [`CacheStore`](mises_store::CacheStore)
//! overlay of the store it is given and only writes them through when the
//! whole handler succeeded. Passing an overlay in nests the unit of work
//! inside the caller's, which is why registration hands its signals back as
//! [`Pending`] instead of emitting them.

use mises_core::{
    AppInfo, DidRegistry, DidType, MisesAccount, MsgCreateDidRegistry,
    MsgCreateDidRegistryResponse, MsgUpdateAppInfo, MsgUpdateUserInfo, MsgUpdateUserRelation,
    UserInfo, UserRelation,
};
use mises_store::{atomically, KvStore};

use crate::account::{account_kind, bind_pub_key, decode_pub_key, Account, AccountKeeper};
use crate::address::addr_from_did;
use crate::error::IdentityError;
use crate::keeper::Keeper;
use crate::telemetry::{Pending, Signal};

fn require_field(name: &str, value: &str) -> Result<(), IdentityError> {
    if value.is_empty() {
        return Err(IdentityError::InvalidArgument(format!(
            "{} must not be empty",
            name
        )));
    }
    Ok(())
}

impl<A: AccountKeeper> Keeper<A> {
    /// Register `msg.did`: account, public key, registry record, profile and
    /// binding are written together or not at all.
    ///
    /// The returned [`Pending`] carries the `AccountCreated` signal. Publish
    /// it once the store `kv` writes into has been committed.
    pub fn create_did_registry<S: KvStore + ?Sized>(
        &self,
        kv: &mut S,
        msg: MsgCreateDidRegistry,
    ) -> Result<Pending<MsgCreateDidRegistryResponse>, IdentityError> {
        require_field("did", &msg.did)?;
        require_field("creator", &msg.creator)?;

        let (reg_id, info_id, did_type) = atomically(kv, |tx| {
            if self.get_user_account(tx, &msg.did)?.is_some() {
                return Err(IdentityError::AlreadyExists(format!(
                    "mises id {} already exists",
                    msg.did
                )));
            }

            let (address, did_type) = addr_from_did(&msg.did)?;

            let mut base = match self.accounts.new_account_with_address(tx, &address)? {
                Account::Base(base) => base,
                other => {
                    return Err(IdentityError::AccountCreationFailed(format!(
                        "ledger returned {} for {}",
                        account_kind(&other),
                        address
                    )))
                }
            };

            let pub_key = decode_pub_key(&msg.pkey_multibase)?;
            bind_pub_key(&mut base, &pub_key)?;
            self.accounts.set_account(tx, Account::Base(base))?;

            let reg_id = self.did_registries.append(
                tx,
                DidRegistry {
                    creator: msg.creator.clone(),
                    id: 0,
                    did: msg.did.clone(),
                    pkey_did: msg.pkey_did.clone(),
                    pkey_type: msg.pkey_type.clone(),
                    pkey_multibase: msg.pkey_multibase.clone(),
                    version: msg.version,
                },
            )?;

            let info_id = match did_type {
                DidType::User => self.user_infos.append(
                    tx,
                    UserInfo {
                        creator: msg.creator.clone(),
                        uid: msg.did.clone(),
                        ..Default::default()
                    },
                )?,
                DidType::App => self.app_infos.append(
                    tx,
                    AppInfo {
                        creator: msg.creator.clone(),
                        appid: msg.did.clone(),
                        ..Default::default()
                    },
                )?,
            };

            self.set_mises_account(
                tx,
                &MisesAccount {
                    mises_id: msg.did.clone(),
                    did_registry_id: reg_id,
                    info_id,
                    did_type: did_type.as_str().to_string(),
                },
            )?;
            Ok((reg_id, info_id, did_type))
        })?;

        tracing::debug!(
            did = %msg.did,
            did_type = did_type.as_str(),
            reg_id,
            info_id,
            "DID registration staged"
        );
        Ok(Pending::new(
            MsgCreateDidRegistryResponse {},
            vec![Signal::AccountCreated {
                did: msg.did,
                did_type,
            }],
        ))
    }

    /// Overwrite the encrypted payload of a user profile.
    pub fn update_user_info<S: KvStore + ?Sized>(
        &self,
        kv: &mut S,
        msg: MsgUpdateUserInfo,
    ) -> Result<(), IdentityError> {
        require_field("uid", &msg.uid)?;
        require_field("creator", &msg.creator)?;

        atomically(kv, |tx| {
            let account = self.require_account(tx, &msg.uid)?;
            if account.did_type != DidType::User.as_str() {
                return Err(IdentityError::InvalidArgument(format!(
                    "{} is not a user",
                    msg.uid
                )));
            }
            let mut info = self.user_info_of(tx, &account)?;
            if info.creator != msg.creator {
                return Err(IdentityError::Unauthorized(format!(
                    "{} does not own {}",
                    msg.creator, msg.uid
                )));
            }
            info.enc_data = msg.enc_data.clone();
            info.iv = msg.iv.clone();
            info.version = msg.version;
            self.user_infos.set(tx, &info)?;
            Ok(())
        })?;

        tracing::debug!(uid = %msg.uid, version = msg.version, "user info updated");
        Ok(())
    }

    /// Overwrite the descriptive fields of an application profile.
    pub fn update_app_info<S: KvStore + ?Sized>(
        &self,
        kv: &mut S,
        msg: MsgUpdateAppInfo,
    ) -> Result<(), IdentityError> {
        require_field("appid", &msg.appid)?;
        require_field("creator", &msg.creator)?;

        atomically(kv, |tx| {
            let account = self.require_account(tx, &msg.appid)?;
            if account.did_type != DidType::App.as_str() {
                return Err(IdentityError::InvalidArgument(format!(
                    "{} is not an app",
                    msg.appid
                )));
            }
            let mut info = self.app_info_of(tx, &account)?;
            if info.creator != msg.creator {
                return Err(IdentityError::Unauthorized(format!(
                    "{} does not own {}",
                    msg.creator, msg.appid
                )));
            }
            info.name = msg.name.clone();
            info.domains = msg.domains.clone();
            info.developer = msg.developer.clone();
            info.home_url = msg.home_url.clone();
            info.icon_url = msg.icon_url.clone();
            info.version = msg.version;
            self.app_infos.set(tx, &info)?;
            Ok(())
        })?;

        tracing::debug!(appid = %msg.appid, version = msg.version, "app info updated");
        Ok(())
    }

    /// Apply a follow/unfollow/block/unblock action to `uid_from -> uid_to`.
    ///
    /// Clearing a bit on an edge that does not exist is a no-op.
    pub fn update_user_relation<S: KvStore + ?Sized>(
        &self,
        kv: &mut S,
        msg: MsgUpdateUserRelation,
    ) -> Result<(), IdentityError> {
        require_field("uid_from", &msg.uid_from)?;
        require_field("uid_to", &msg.uid_to)?;
        require_field("creator", &msg.creator)?;
        if msg.uid_from == msg.uid_to {
            return Err(IdentityError::InvalidArgument(format!(
                "{} cannot relate to itself",
                msg.uid_from
            )));
        }

        let rel_type = atomically(kv, |tx| {
            let from = self.require_account(tx, &msg.uid_from)?;
            self.require_account(tx, &msg.uid_to)?;
            if from.did_type != DidType::User.as_str() {
                return Err(IdentityError::InvalidArgument(format!(
                    "{} is not a user",
                    msg.uid_from
                )));
            }
            let owner = self.user_info_of(tx, &from)?;
            if owner.creator != msg.creator {
                return Err(IdentityError::Unauthorized(format!(
                    "{} does not own {}",
                    msg.creator, msg.uid_from
                )));
            }

            match self.find_relation(tx, &msg.uid_from, &msg.uid_to)? {
                Some(mut relation) => {
                    relation.rel_type = msg.action.apply(relation.rel_type);
                    relation.version = msg.version;
                    self.user_relations.set(tx, &relation)?;
                    Ok(relation.rel_type)
                }
                None if msg.action.sets_bit() => {
                    let mut relation = UserRelation {
                        creator: msg.creator.clone(),
                        id: 0,
                        uid_from: msg.uid_from.clone(),
                        uid_to: msg.uid_to.clone(),
                        rel_type: msg.action.apply(0),
                        version: msg.version,
                    };
                    relation.id = self.user_relations.append(tx, relation.clone())?;
                    self.index_relation(tx, &relation)?;
                    Ok(relation.rel_type)
                }
                None => Ok(0),
            }
        })?;

        tracing::debug!(
            uid_from = %msg.uid_from,
            uid_to = %msg.uid_to,
            action = %msg.action,
            rel_type,
            "user relation updated"
        );
        Ok(())
    }
}
