use std::sync::Arc;

use mises_core::{
    AccAddress, AppInfo, DidRegistry, DidType, MisesAccount, RelType, UserInfo, UserRelation,
};
use mises_store::{
    id_bytes, id_from_bytes, key_successor, KeyedStore, KvStore, SequencedStore, StoreError,
};

use crate::account::{Account, AccountKeeper, KvAccountKeeper};
use crate::error::IdentityError;
use crate::telemetry::{NoopTelemetry, Pending, Telemetry};

const MISES_ACCOUNT_NAMESPACE: &str = "MisesAccount/";
const RELATION_EDGE_NAMESPACE: &[u8] = b"UserRelationEdge/";

/// Tunables for the query surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeeperParams {
    /// Page size when the caller sends no pagination.
    pub default_page_limit: u64,
    /// Upper bound on any requested page size.
    pub max_page_limit: u64,
}

impl Default for KeeperParams {
    fn default() -> Self {
        Self {
            default_page_limit: 100,
            max_page_limit: 1000,
        }
    }
}

/// Owns the identity module's tables and its collaborators.
///
/// The keeper itself is stateless: every method takes the store to operate
/// on, so the caller decides whether that is the backend or an overlay.
pub struct Keeper<A = KvAccountKeeper> {
    pub(crate) did_registries: SequencedStore<DidRegistry>,
    pub(crate) user_infos: SequencedStore<UserInfo>,
    pub(crate) app_infos: SequencedStore<AppInfo>,
    pub(crate) user_relations: SequencedStore<UserRelation>,
    pub(crate) mises_accounts: KeyedStore<MisesAccount>,
    pub(crate) accounts: A,
    pub(crate) telemetry: Arc<dyn Telemetry>,
    pub(crate) params: KeeperParams,
}

impl Keeper<KvAccountKeeper> {
    /// Keeper with the store-backed account ledger and default params.
    pub fn new(telemetry: Arc<dyn Telemetry>) -> Self {
        Self::with_account_keeper(KvAccountKeeper::new(), telemetry, KeeperParams::default())
    }
}

impl Default for Keeper<KvAccountKeeper> {
    fn default() -> Self {
        Self::new(Arc::new(NoopTelemetry))
    }
}

impl<A: AccountKeeper> Keeper<A> {
    pub fn with_account_keeper(accounts: A, telemetry: Arc<dyn Telemetry>, params: KeeperParams) -> Self {
        Self {
            did_registries: SequencedStore::new(),
            user_infos: SequencedStore::new(),
            app_infos: SequencedStore::new(),
            user_relations: SequencedStore::new(),
            mises_accounts: KeyedStore::new(MISES_ACCOUNT_NAMESPACE),
            accounts,
            telemetry,
            params,
        }
    }

    pub fn params(&self) -> &KeeperParams {
        &self.params
    }

    /// Emit the signals of a committed handler to this keeper's telemetry.
    pub fn publish<T>(&self, pending: Pending<T>) -> T {
        pending.publish(self.telemetry.as_ref())
    }

    pub fn did_registries(&self) -> &SequencedStore<DidRegistry> {
        &self.did_registries
    }

    pub fn user_infos(&self) -> &SequencedStore<UserInfo> {
        &self.user_infos
    }

    pub fn app_infos(&self) -> &SequencedStore<AppInfo> {
        &self.app_infos
    }

    pub fn user_relations(&self) -> &SequencedStore<UserRelation> {
        &self.user_relations
    }

    /// The binding for `did`, if it was registered.
    pub fn get_user_account<S: KvStore + ?Sized>(
        &self,
        kv: &S,
        did: &str,
    ) -> Result<Option<MisesAccount>, IdentityError> {
        Ok(self.mises_accounts.get(kv, did)?)
    }

    pub fn set_mises_account<S: KvStore + ?Sized>(
        &self,
        kv: &mut S,
        account: &MisesAccount,
    ) -> Result<(), IdentityError> {
        Ok(self.mises_accounts.set(kv, &account.mises_id, account)?)
    }

    /// Every registered binding, ascending by DID.
    pub fn all_mises_accounts<S: KvStore + ?Sized>(
        &self,
        kv: &S,
    ) -> Result<Vec<MisesAccount>, IdentityError> {
        Ok(self
            .mises_accounts
            .get_all(kv)?
            .into_iter()
            .map(|(_, account)| account)
            .collect())
    }

    /// The binding for `mises_id`, or `NotFound`.
    pub(crate) fn require_account<S: KvStore + ?Sized>(
        &self,
        kv: &S,
        mises_id: &str,
    ) -> Result<MisesAccount, IdentityError> {
        self.get_user_account(kv, mises_id)?.ok_or_else(|| {
            tracing::debug!(mises_id, "mises id not registered");
            IdentityError::not_registered(mises_id)
        })
    }

    /// Chain account stored at `address`.
    pub fn account<S: KvStore + ?Sized>(
        &self,
        kv: &S,
        address: &AccAddress,
    ) -> Result<Option<Account>, IdentityError> {
        self.accounts.get_account(kv, address)
    }

    pub(crate) fn user_info_of<S: KvStore + ?Sized>(
        &self,
        kv: &S,
        account: &MisesAccount,
    ) -> Result<UserInfo, IdentityError> {
        if account.did_type != DidType::User.as_str() {
            return Err(IdentityError::NotFound(format!(
                "mises id {} has no user profile",
                account.mises_id
            )));
        }
        self.user_infos
            .get(kv, account.info_id)?
            .ok_or_else(|| IdentityError::NotFound(format!("user info {}", account.info_id)))
    }

    pub(crate) fn app_info_of<S: KvStore + ?Sized>(
        &self,
        kv: &S,
        account: &MisesAccount,
    ) -> Result<AppInfo, IdentityError> {
        if account.did_type != DidType::App.as_str() {
            return Err(IdentityError::NotFound(format!(
                "mises id {} has no app profile",
                account.mises_id
            )));
        }
        self.app_infos
            .get(kv, account.info_id)?
            .ok_or_else(|| IdentityError::NotFound(format!("app info {}", account.info_id)))
    }

    /// Key of the `uid_from -> uid_to` entry in the edge index. DIDs never
    /// contain NUL, so the separator is unambiguous.
    pub(crate) fn edge_key(uid_from: &str, uid_to: &str) -> Vec<u8> {
        let mut key = Self::edge_prefix(uid_from);
        key.extend_from_slice(uid_to.as_bytes());
        key
    }

    fn edge_prefix(uid_from: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(RELATION_EDGE_NAMESPACE.len() + uid_from.len() + 1);
        key.extend_from_slice(RELATION_EDGE_NAMESPACE);
        key.extend_from_slice(uid_from.as_bytes());
        key.push(0);
        key
    }

    /// Resolve an edge index entry to its relation record.
    pub(crate) fn relation_at<S: KvStore + ?Sized>(
        &self,
        kv: &S,
        index_key: &[u8],
        index_value: &[u8],
    ) -> Result<UserRelation, IdentityError> {
        let corrupt = |reason: &str| StoreError::DecodeCorruption {
            namespace: String::from_utf8_lossy(RELATION_EDGE_NAMESPACE).into_owned(),
            key: String::from_utf8_lossy(index_key).into_owned(),
            reason: reason.to_string(),
        };
        let id = id_from_bytes(index_value).ok_or_else(|| corrupt("index value is not an id"))?;
        Ok(self
            .user_relations
            .get(kv, id)?
            .ok_or_else(|| corrupt("index points at a missing relation"))?)
    }

    /// The existing edge `uid_from -> uid_to`, if any.
    pub(crate) fn find_relation<S: KvStore + ?Sized>(
        &self,
        kv: &S,
        uid_from: &str,
        uid_to: &str,
    ) -> Result<Option<UserRelation>, IdentityError> {
        let key = Self::edge_key(uid_from, uid_to);
        kv.get(&key)?
            .map(|value| self.relation_at(kv, &key, &value))
            .transpose()
    }

    pub(crate) fn index_relation<S: KvStore + ?Sized>(
        &self,
        kv: &mut S,
        relation: &UserRelation,
    ) -> Result<(), IdentityError> {
        let key = Self::edge_key(&relation.uid_from, &relation.uid_to);
        Ok(kv.set(&key, &id_bytes(relation.id))?)
    }

    /// Outgoing edges of `uid_from`, ordered by target DID.
    ///
    /// `rel_type == RelType::ANY` matches any edge with at least one bit
    /// set; otherwise an edge matches when it shares a bit with `rel_type`.
    /// Targets `<= last_key` are skipped when `last_key` is non-empty, so
    /// the last returned target is a stable cursor for the next page.
    /// The scan seeks straight past the cursor and reads the index in
    /// chunks of `limit`, stopping as soon as the page is full.
    pub fn get_user_relations<S: KvStore + ?Sized>(
        &self,
        kv: &S,
        rel_type: u64,
        uid_from: &str,
        last_key: &str,
        limit: usize,
    ) -> Result<Vec<UserRelation>, IdentityError> {
        let prefix = Self::edge_prefix(uid_from);
        let mut out = Vec::new();
        if limit == 0 {
            return Ok(out);
        }

        let mut start = if last_key.is_empty() {
            prefix.clone()
        } else {
            key_successor(&Self::edge_key(uid_from, last_key))
        };

        loop {
            let chunk = kv.scan_from(&prefix, &start, limit)?;
            let exhausted = chunk.len() < limit;

            for (key, value) in &chunk {
                let relation = self.relation_at(kv, key, value)?;
                let matches = if rel_type == RelType::ANY {
                    relation.rel_type != 0
                } else {
                    relation.rel_type & rel_type != 0
                };
                if matches {
                    out.push(relation);
                    if out.len() >= limit {
                        return Ok(out);
                    }
                }
            }

            match chunk.last() {
                Some((key, _)) if !exhausted => start = key_successor(key),
                _ => return Ok(out),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mises_store::MemoryStore;

    fn relate(keeper: &Keeper, store: &mut MemoryStore, from: &str, to: &str, rel_type: u64) {
        let mut rel = UserRelation {
            creator: "c".into(),
            uid_from: from.into(),
            uid_to: to.into(),
            rel_type,
            ..Default::default()
        };
        rel.id = keeper.user_relations.append(store, rel.clone()).unwrap();
        keeper.index_relation(store, &rel).unwrap();
    }

    #[test]
    fn test_get_user_account_absent() {
        let keeper = Keeper::default();
        let store = MemoryStore::new();
        assert!(keeper
            .get_user_account(&store, "did:mises:user:a")
            .unwrap()
            .is_none());
        assert!(matches!(
            keeper.require_account(&store, "did:mises:user:a"),
            Err(IdentityError::NotFound(ref m)) if m == "mises id did:mises:user:a not exists"
        ));
    }

    #[test]
    fn test_set_mises_account() {
        let keeper = Keeper::default();
        let mut store = MemoryStore::new();
        let acc = MisesAccount {
            mises_id: "did:mises:user:a".into(),
            did_registry_id: 0,
            info_id: 0,
            did_type: "user".into(),
        };
        keeper.set_mises_account(&mut store, &acc).unwrap();
        assert_eq!(
            keeper.get_user_account(&store, "did:mises:user:a").unwrap(),
            Some(acc)
        );
        assert_eq!(keeper.all_mises_accounts(&store).unwrap().len(), 1);
    }

    #[test]
    fn test_relations_sorted_and_filtered() {
        let keeper = Keeper::default();
        let mut store = MemoryStore::new();
        let me = "did:mises:user:me";
        relate(&keeper, &mut store, me, "did:mises:user:c", RelType::FOLLOW);
        relate(&keeper, &mut store, me, "did:mises:user:a", RelType::FOLLOW);
        relate(&keeper, &mut store, me, "did:mises:user:b", RelType::BLOCK);
        relate(&keeper, &mut store, me, "did:mises:user:d", 0);
        relate(&keeper, &mut store, "did:mises:user:other", "did:mises:user:a", RelType::FOLLOW);

        let follows: Vec<String> = keeper
            .get_user_relations(&store, RelType::FOLLOW, me, "", 10)
            .unwrap()
            .into_iter()
            .map(|r| r.uid_to)
            .collect();
        assert_eq!(follows, vec!["did:mises:user:a", "did:mises:user:c"]);

        let any: Vec<String> = keeper
            .get_user_relations(&store, RelType::ANY, me, "", 10)
            .unwrap()
            .into_iter()
            .map(|r| r.uid_to)
            .collect();
        assert_eq!(
            any,
            vec!["did:mises:user:a", "did:mises:user:b", "did:mises:user:c"]
        );
    }

    #[test]
    fn test_relations_cursor_and_limit() {
        let keeper = Keeper::default();
        let mut store = MemoryStore::new();
        let me = "did:mises:user:me";
        for t in ["a", "b", "c", "d", "e"] {
            relate(
                &keeper,
                &mut store,
                me,
                &format!("did:mises:user:{}", t),
                RelType::FOLLOW,
            );
        }

        let page1 = keeper
            .get_user_relations(&store, RelType::FOLLOW, me, "", 2)
            .unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(page1[1].uid_to, "did:mises:user:b");

        let page2 = keeper
            .get_user_relations(&store, RelType::FOLLOW, me, &page1[1].uid_to, 2)
            .unwrap();
        let targets: Vec<&str> = page2.iter().map(|r| r.uid_to.as_str()).collect();
        assert_eq!(targets, vec!["did:mises:user:c", "did:mises:user:d"]);

        assert!(keeper
            .get_user_relations(&store, RelType::FOLLOW, me, "", 0)
            .unwrap()
            .is_empty());
    }

    /// Counts index entries handed out by scans.
    struct CountingStore {
        inner: MemoryStore,
        scanned: std::cell::Cell<usize>,
    }

    impl KvStore for CountingStore {
        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
            self.inner.set(key, value)
        }

        fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
            self.inner.delete(key)
        }

        fn prefix_scan(&self, prefix: &[u8]) -> Result<mises_store::ScanResult, StoreError> {
            let out = self.inner.prefix_scan(prefix)?;
            self.scanned.set(self.scanned.get() + out.len());
            Ok(out)
        }

        fn scan_from(
            &self,
            prefix: &[u8],
            start: &[u8],
            limit: usize,
        ) -> Result<mises_store::ScanResult, StoreError> {
            let out = self.inner.scan_from(prefix, start, limit)?;
            self.scanned.set(self.scanned.get() + out.len());
            Ok(out)
        }

        fn write_batch(
            &mut self,
            operations: Vec<mises_store::BatchOperation>,
        ) -> Result<(), StoreError> {
            self.inner.write_batch(operations)
        }
    }

    #[test]
    fn test_page_reads_only_past_cursor() {
        let keeper = Keeper::default();
        let mut store = MemoryStore::new();
        let me = "did:mises:user:me";
        for i in 0..50 {
            relate(
                &keeper,
                &mut store,
                me,
                &format!("did:mises:user:{:02}", i),
                RelType::FOLLOW,
            );
        }
        let store = CountingStore {
            inner: store,
            scanned: std::cell::Cell::new(0),
        };

        let page = keeper
            .get_user_relations(&store, RelType::FOLLOW, me, "did:mises:user:39", 5)
            .unwrap();
        let targets: Vec<&str> = page.iter().map(|r| r.uid_to.as_str()).collect();
        assert_eq!(
            targets,
            vec![
                "did:mises:user:40",
                "did:mises:user:41",
                "did:mises:user:42",
                "did:mises:user:43",
                "did:mises:user:44",
            ]
        );
        assert_eq!(store.scanned.get(), 5);
    }

    #[test]
    fn test_filtered_page_spans_chunks() {
        let keeper = Keeper::default();
        let mut store = MemoryStore::new();
        let me = "did:mises:user:me";
        for i in 0..20 {
            let rel_type = if i % 4 == 3 { RelType::FOLLOW } else { RelType::BLOCK };
            relate(
                &keeper,
                &mut store,
                me,
                &format!("did:mises:user:{:02}", i),
                rel_type,
            );
        }

        let page = keeper
            .get_user_relations(&store, RelType::FOLLOW, me, "", 3)
            .unwrap();
        let targets: Vec<&str> = page.iter().map(|r| r.uid_to.as_str()).collect();
        assert_eq!(
            targets,
            vec!["did:mises:user:03", "did:mises:user:07", "did:mises:user:11"]
        );

        let rest = keeper
            .get_user_relations(&store, RelType::FOLLOW, me, "did:mises:user:11", 3)
            .unwrap();
        let targets: Vec<&str> = rest.iter().map(|r| r.uid_to.as_str()).collect();
        assert_eq!(targets, vec!["did:mises:user:15", "did:mises:user:19"]);
    }

    #[test]
    fn test_prefix_does_not_leak_between_sources() {
        let keeper = Keeper::default();
        let mut store = MemoryStore::new();
        // "did:mises:user:a" is a byte prefix of "did:mises:user:ab"
        relate(&keeper, &mut store, "did:mises:user:ab", "did:mises:user:x", RelType::FOLLOW);
        assert!(keeper
            .get_user_relations(&store, RelType::ANY, "did:mises:user:a", "", 10)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_corrupt_edge_index() {
        let keeper = Keeper::default();
        let mut store = MemoryStore::new();
        let key = Keeper::<KvAccountKeeper>::edge_key("did:mises:user:a", "did:mises:user:b");
        store.set(&key, b"bad").unwrap();
        let err = keeper
            .get_user_relations(&store, RelType::ANY, "did:mises:user:a", "", 10)
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
