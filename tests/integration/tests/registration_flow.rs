//! Integration test: DID registration and the query surface, end to end
//! over the in-memory store.

use std::sync::Arc;

use mises_core::{
    MsgUpdateUserInfo, QueryDidRequest, QueryUserRelationRequest, QueryUserRequest,
};
use mises_identity::{
    addr_from_did, Account, IdentityError, Keeper, KeeperParams, KvAccountKeeper,
    MetricsRegistry,
};
use mises_integration_tests::{register_msg, CREATOR};
use mises_store::{CacheStore, KvStore, MemoryStore, SequencedStore};

fn keeper() -> (Keeper, Arc<MetricsRegistry>) {
    let metrics = Arc::new(MetricsRegistry::new());
    let keeper = Keeper::with_account_keeper(
        KvAccountKeeper::new(),
        metrics.clone(),
        KeeperParams::default(),
    );
    (keeper, metrics)
}

// =========================================================================
// Registration
// =========================================================================

#[test]
fn test_register_then_query_user() {
    let (keeper, metrics) = keeper();
    let mut store = MemoryStore::new();
    let did = "did:mises:user:abc";
    let msg = register_msg(did, 1);

    let pending = keeper.create_did_registry(&mut store, msg.clone()).unwrap();
    keeper.publish(pending);

    let resp = keeper
        .query_did(&store, &QueryDidRequest { mises_id: did.into() })
        .unwrap();
    assert_eq!(resp.did_registry.did, did);
    assert_eq!(resp.did_registry.pkey_multibase, msg.pkey_multibase);
    assert_eq!(resp.did_registry.creator, CREATOR);

    let user = keeper
        .query_user(&store, &QueryUserRequest { mises_id: did.into() })
        .unwrap();
    assert!(user.pri_info.enc_data.is_empty());
    assert!(user.pri_info.iv.is_empty());

    let rel = keeper
        .query_user_relation(
            &store,
            &QueryUserRelationRequest {
                mises_id: did.into(),
                filter: "following".into(),
                pagination: None,
            },
        )
        .unwrap();
    assert!(rel.mises_list.is_empty());
    assert!(rel.pagination.next_key.is_empty());

    assert_eq!(metrics.get("new.account"), 1);
}

#[test]
fn test_account_carries_registered_key() {
    let (keeper, _) = keeper();
    let mut store = MemoryStore::new();
    let did = "did:mises:app:swap";
    keeper.create_did_registry(&mut store, register_msg(did, 3)).unwrap();

    let (address, _) = addr_from_did(did).unwrap();
    let account = keeper.account(&store, &address).unwrap();
    match account {
        Some(Account::Base(base)) => {
            assert_eq!(base.address, address.to_hex());
            assert_eq!(base.account_number, 0);
            let key = base.pub_key.expect("key bound at registration");
            assert_eq!(bs58::encode(&key.key).into_string(), register_msg(did, 3).pkey_multibase);
        }
        other => panic!("expected a base account, got {:?}", other),
    }
}

#[test]
fn test_duplicate_registration_creates_nothing() {
    let (keeper, metrics) = keeper();
    let mut store = MemoryStore::new();
    let did = "did:mises:user:abc";
    let pending = keeper.create_did_registry(&mut store, register_msg(did, 1)).unwrap();
    keeper.publish(pending);

    let err = keeper
        .create_did_registry(&mut store, register_msg(did, 2))
        .unwrap_err();
    assert!(matches!(err, IdentityError::AlreadyExists(_)));

    assert_eq!(keeper.did_registries().count(&store).unwrap(), 1);
    assert_eq!(keeper.user_infos().count(&store).unwrap(), 1);
    assert_eq!(keeper.all_mises_accounts(&store).unwrap().len(), 1);
    assert_eq!(metrics.get("new.account"), 1);
}

#[test]
fn test_ids_are_assigned_in_call_order() {
    let (keeper, _) = keeper();
    let mut store = MemoryStore::new();
    let dids = [
        "did:mises:user:c",
        "did:mises:app:b",
        "did:mises:user:a",
    ];
    for (i, did) in dids.iter().enumerate() {
        keeper
            .create_did_registry(&mut store, register_msg(did, i as u8 + 1))
            .unwrap();
    }

    let registries = keeper.did_registries().get_all(&store).unwrap();
    let in_order: Vec<&str> = registries.iter().map(|r| r.did.as_str()).collect();
    assert_eq!(in_order, dids);
    let ids: Vec<u64> = registries.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);

    // profiles are numbered per entity type
    let a = keeper.get_user_account(&store, "did:mises:user:a").unwrap().unwrap();
    assert_eq!((a.did_registry_id, a.info_id), (2, 1));
    let b = keeper.get_user_account(&store, "did:mises:app:b").unwrap().unwrap();
    assert_eq!((b.did_registry_id, b.info_id), (1, 0));
}

#[test]
fn test_rejected_registrations_leave_store_untouched() {
    let (keeper, _) = keeper();
    let mut store = MemoryStore::new();

    let mut bad_key = register_msg("did:mises:user:abc", 1);
    bad_key.pkey_multibase = bs58::encode([7u8; 12]).into_string();
    assert!(matches!(
        keeper.create_did_registry(&mut store, bad_key),
        Err(IdentityError::InvalidPublicKey(_))
    ));
    assert!(matches!(
        keeper.create_did_registry(&mut store, register_msg("did:mises:robot:abc", 1)),
        Err(IdentityError::UnsupportedDidType(_))
    ));
    assert!(matches!(
        keeper.create_did_registry(&mut store, register_msg("did:web:abc", 1)),
        Err(IdentityError::InvalidDid(_))
    ));
    assert!(store.is_empty());
}

#[test]
fn test_unregistered_queries_fail() {
    let (keeper, _) = keeper();
    let store = MemoryStore::new();
    let ghost = "did:mises:user:ghost";
    assert!(matches!(
        keeper.query_did(&store, &QueryDidRequest { mises_id: ghost.into() }),
        Err(IdentityError::NotFound(_))
    ));
    assert!(matches!(
        keeper.query_user(&store, &QueryUserRequest { mises_id: ghost.into() }),
        Err(IdentityError::NotFound(_))
    ));
    assert!(matches!(
        keeper.query_user_relation(
            &store,
            &QueryUserRelationRequest {
                mises_id: ghost.into(),
                ..Default::default()
            }
        ),
        Err(IdentityError::NotFound(_))
    ));
}

// =========================================================================
// Units of work
// =========================================================================

#[test]
fn test_batch_of_messages_commits_together() {
    let (keeper, metrics) = keeper();
    let mut store = MemoryStore::new();

    let (pending, ops) = {
        let mut tx = CacheStore::new(&store);
        let pending = keeper
            .create_did_registry(&mut tx, register_msg("did:mises:user:abc", 1))
            .unwrap();
        keeper
            .update_user_info(
                &mut tx,
                MsgUpdateUserInfo {
                    creator: CREATOR.into(),
                    uid: "did:mises:user:abc".into(),
                    enc_data: "sealed".into(),
                    iv: "nonce".into(),
                    version: 1,
                },
            )
            .unwrap();
        // nothing visible outside the overlay yet
        assert!(store.is_empty());
        (pending, tx.into_batch())
    };
    assert_eq!(metrics.get("new.account"), 0);
    store.write_batch(ops).unwrap();
    keeper.publish(pending);
    assert_eq!(metrics.get("new.account"), 1);

    let user = keeper
        .query_user(&store, &QueryUserRequest { mises_id: "did:mises:user:abc".into() })
        .unwrap();
    assert_eq!(user.pri_info.enc_data, "sealed");
}

#[test]
fn test_dropped_batch_counts_no_account() {
    let (keeper, metrics) = keeper();
    let store = MemoryStore::new();
    {
        let mut tx = CacheStore::new(&store);
        keeper
            .create_did_registry(&mut tx, register_msg("did:mises:user:abc", 1))
            .unwrap();
    }
    assert!(store.is_empty());
    assert_eq!(metrics.get("new.account"), 0);
}

#[test]
fn test_sequenced_store_is_independent_of_keeper() {
    let (keeper, _) = keeper();
    let mut store = MemoryStore::new();
    keeper
        .create_did_registry(&mut store, register_msg("did:mises:user:abc", 1))
        .unwrap();

    let registries: SequencedStore<mises_core::DidRegistry> = SequencedStore::new();
    assert_eq!(registries.count(&store).unwrap(), 1);
    assert!(registries.has(&store, 0).unwrap());
}
