//! Integration test: identity state survives reopening the RocksDB store.

use mises_core::{QueryDidRequest, QueryUserRelationRequest, RelationAction};
use mises_identity::Keeper;
use mises_integration_tests::{register_msg, relation_msg, TempDir};
use mises_store::{atomically, KvStore, RocksStore, SequencedStore, StoreError};

#[test]
fn test_registration_survives_reopen() {
    let dir = TempDir::new("mises-it-rocks");
    let keeper = Keeper::default();

    {
        let mut store = RocksStore::open(dir.path(), false).unwrap();
        keeper
            .create_did_registry(&mut store, register_msg("did:mises:user:a", 1))
            .unwrap();
        keeper
            .create_did_registry(&mut store, register_msg("did:mises:user:b", 2))
            .unwrap();
        keeper
            .update_user_relation(
                &mut store,
                relation_msg("did:mises:user:a", "did:mises:user:b", RelationAction::Follow),
            )
            .unwrap();
    }

    let mut store = RocksStore::open(dir.path(), false).unwrap();
    let resp = keeper
        .query_did(&store, &QueryDidRequest { mises_id: "did:mises:user:b".into() })
        .unwrap();
    assert_eq!(resp.did_registry.id, 1);

    let rel = keeper
        .query_user_relation(
            &store,
            &QueryUserRelationRequest {
                mises_id: "did:mises:user:a".into(),
                filter: "following".into(),
                pagination: None,
            },
        )
        .unwrap();
    assert_eq!(rel.mises_list.len(), 1);
    assert_eq!(rel.mises_list[0].mises_id, "did:mises:user:b");

    // counters continue where they left off
    keeper
        .create_did_registry(&mut store, register_msg("did:mises:user:c", 3))
        .unwrap();
    assert_eq!(keeper.did_registries().count(&store).unwrap(), 3);
    assert_eq!(keeper.user_infos().count(&store).unwrap(), 3);
}

#[test]
fn test_failed_unit_of_work_is_not_persisted() {
    let dir = TempDir::new("mises-it-rollback");
    let registries: SequencedStore<mises_core::DidRegistry> = SequencedStore::new();

    {
        let mut store = RocksStore::open(dir.path(), false).unwrap();
        let result: Result<(), StoreError> = atomically(&mut store, |tx| {
            registries.append(tx, mises_core::DidRegistry::default())?;
            registries.append(tx, mises_core::DidRegistry::default())?;
            Err(StoreError::Backend("abort".into()))
        });
        assert!(result.is_err());
    }

    let store = RocksStore::open(dir.path(), false).unwrap();
    assert_eq!(registries.count(&store).unwrap(), 0);
    assert!(store.prefix_scan(b"DidRegistry/").unwrap().is_empty());
}

#[test]
fn test_corrupt_counter_is_fatal() {
    let dir = TempDir::new("mises-it-corrupt");
    let keeper = Keeper::default();
    let mut store = RocksStore::open(dir.path(), false).unwrap();
    store.set(b"DidRegistry/count", b"not-a-number").unwrap();

    let err = keeper
        .create_did_registry(&mut store, register_msg("did:mises:user:a", 1))
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(keeper
        .get_user_account(&store, "did:mises:user:a")
        .unwrap()
        .is_none());
}
