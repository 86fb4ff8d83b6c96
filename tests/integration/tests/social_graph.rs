//! Integration test: follow/block edges and paginated relation queries.

use mises_core::{PageRequest, QueryUserRelationRequest, RelType, RelationAction};
use mises_identity::{IdentityError, Keeper};
use mises_integration_tests::{register_msg, relation_msg};
use mises_store::MemoryStore;

const ME: &str = "did:mises:user:me";

/// Registers `ME` and one user per name, returning their DIDs.
fn setup(keeper: &Keeper, store: &mut MemoryStore, names: &[&str]) -> Vec<String> {
    keeper.create_did_registry(store, register_msg(ME, 1)).unwrap();
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let did = format!("did:mises:user:{}", name);
            keeper
                .create_did_registry(store, register_msg(&did, i as u8 + 2))
                .unwrap();
            did
        })
        .collect()
}

fn page(
    keeper: &Keeper,
    store: &MemoryStore,
    filter: &str,
    key: &str,
    limit: u64,
) -> (Vec<String>, String) {
    let resp = keeper
        .query_user_relation(
            store,
            &QueryUserRelationRequest {
                mises_id: ME.into(),
                filter: filter.into(),
                pagination: Some(PageRequest {
                    key: key.into(),
                    limit,
                }),
            },
        )
        .unwrap();
    (
        resp.mises_list.into_iter().map(|m| m.mises_id).collect(),
        resp.pagination.next_key,
    )
}

#[test]
fn test_walk_all_pages() {
    let keeper = Keeper::default();
    let mut store = MemoryStore::new();
    let users = setup(&keeper, &mut store, &["olga", "bob", "zed", "amy", "kim", "dan", "eve"]);
    for did in &users {
        keeper
            .update_user_relation(&mut store, relation_msg(ME, did, RelationAction::Follow))
            .unwrap();
    }

    let mut seen = Vec::new();
    let mut key = String::new();
    loop {
        let (ids, next) = page(&keeper, &store, "following", &key, 3);
        if ids.is_empty() {
            break;
        }
        seen.extend(ids);
        key = next;
    }

    let mut expected = users.clone();
    expected.sort();
    assert_eq!(seen, expected);
}

#[test]
fn test_insert_between_pages_is_not_skipped_or_repeated() {
    let keeper = Keeper::default();
    let mut store = MemoryStore::new();
    let users = setup(&keeper, &mut store, &["b", "d", "f", "a", "e"]);
    for did in &users[..3] {
        keeper
            .update_user_relation(&mut store, relation_msg(ME, did, RelationAction::Follow))
            .unwrap();
    }

    let (first, key) = page(&keeper, &store, "following", "", 2);
    assert_eq!(first, vec!["did:mises:user:b", "did:mises:user:d"]);

    // one edge sorts before the cursor, one after
    keeper
        .update_user_relation(&mut store, relation_msg(ME, &users[3], RelationAction::Follow))
        .unwrap();
    keeper
        .update_user_relation(&mut store, relation_msg(ME, &users[4], RelationAction::Follow))
        .unwrap();

    let (second, _) = page(&keeper, &store, "following", &key, 10);
    assert_eq!(second, vec!["did:mises:user:e", "did:mises:user:f"]);
}

#[test]
fn test_filter_separates_follow_and_block() {
    let keeper = Keeper::default();
    let mut store = MemoryStore::new();
    let users = setup(&keeper, &mut store, &["a", "b", "c"]);

    keeper
        .update_user_relation(&mut store, relation_msg(ME, &users[0], RelationAction::Follow))
        .unwrap();
    keeper
        .update_user_relation(&mut store, relation_msg(ME, &users[1], RelationAction::Block))
        .unwrap();
    keeper
        .update_user_relation(&mut store, relation_msg(ME, &users[2], RelationAction::Follow))
        .unwrap();
    keeper
        .update_user_relation(&mut store, relation_msg(ME, &users[2], RelationAction::Unfollow))
        .unwrap();

    let (following, _) = page(&keeper, &store, "following", "", 0);
    assert_eq!(following, vec!["did:mises:user:a"]);

    // unfiltered: any edge with a bit still set
    let (all, next) = page(&keeper, &store, "", "", 0);
    assert_eq!(all, vec!["did:mises:user:a", "did:mises:user:b"]);
    assert_eq!(next, "did:mises:user:b");

    let blocked = keeper
        .get_user_relations(&store, RelType::BLOCK, ME, "", 10)
        .unwrap();
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].uid_to, "did:mises:user:b");
}

#[test]
fn test_edges_are_directed() {
    let keeper = Keeper::default();
    let mut store = MemoryStore::new();
    let users = setup(&keeper, &mut store, &["a"]);
    keeper
        .update_user_relation(&mut store, relation_msg(ME, &users[0], RelationAction::Follow))
        .unwrap();

    let reverse = keeper
        .get_user_relations(&store, RelType::ANY, &users[0], "", 10)
        .unwrap();
    assert!(reverse.is_empty());
}

#[test]
fn test_apps_cannot_follow() {
    let keeper = Keeper::default();
    let mut store = MemoryStore::new();
    let users = setup(&keeper, &mut store, &["a"]);
    keeper
        .create_did_registry(&mut store, register_msg("did:mises:app:swap", 40))
        .unwrap();

    assert!(matches!(
        keeper.update_user_relation(
            &mut store,
            relation_msg("did:mises:app:swap", &users[0], RelationAction::Follow)
        ),
        Err(IdentityError::InvalidArgument(_))
    ));
    assert_eq!(keeper.user_relations().count(&store).unwrap(), 0);
}
