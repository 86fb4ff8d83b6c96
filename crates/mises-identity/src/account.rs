//! Account ledger used by DID registration.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use mises_core::{AccAddress, BaseAccount, PubKey, StoredAccount};
use mises_store::{KeyedStore, KvStore, StoreError};

use crate::error::IdentityError;

pub use mises_core::records::stored_account::Account;

const ACCOUNT_NAMESPACE: &str = "Account/";
const ACCOUNT_NUMBER_KEY: &[u8] = b"AccountNumber/global";

/// Ledger that owns chain accounts.
///
/// Methods take the store they operate on so that account writes land in
/// the same unit of work as the identity records.
pub trait AccountKeeper {
    /// Build a fresh account for `address`. Nothing is persisted until
    /// [`AccountKeeper::set_account`].
    fn new_account_with_address<S: KvStore + ?Sized>(
        &self,
        kv: &mut S,
        address: &AccAddress,
    ) -> Result<Account, IdentityError>;

    fn set_account<S: KvStore + ?Sized>(&self, kv: &mut S, account: Account)
        -> Result<(), IdentityError>;

    fn get_account<S: KvStore + ?Sized>(
        &self,
        kv: &S,
        address: &AccAddress,
    ) -> Result<Option<Account>, IdentityError>;
}

/// Human readable account capability, used in error messages.
pub fn account_kind(account: &Account) -> &'static str {
    match account {
        Account::Base(_) => "BaseAccount",
        Account::Module(_) => "ModuleAccount",
    }
}

fn account_address(account: &Account) -> &str {
    match account {
        Account::Base(base) => &base.address,
        Account::Module(module) => module
            .base_account
            .as_ref()
            .map(|b| b.address.as_str())
            .unwrap_or_default(),
    }
}

/// Decode a base58 public key into a secp256k1 point.
///
/// A leading multibase `z` (base58btc) prefix is accepted when the plain
/// decode does not yield a valid key.
pub fn decode_pub_key(multibase: &str) -> Result<k256::PublicKey, IdentityError> {
    if multibase.is_empty() {
        return Err(IdentityError::InvalidPublicKey(
            "public key must not be empty".into(),
        ));
    }

    let parse = |encoded: &str| -> Result<k256::PublicKey, String> {
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| format!("base58 decode failed: {}", e))?;
        k256::PublicKey::from_sec1_bytes(&bytes)
            .map_err(|_| format!("{} bytes are not a secp256k1 public key", bytes.len()))
    };

    match parse(multibase) {
        Ok(key) => Ok(key),
        Err(first) => match multibase.strip_prefix('z') {
            Some(rest) if !rest.is_empty() => {
                parse(rest).map_err(|_| IdentityError::InvalidPublicKey(first))
            }
            _ => Err(IdentityError::InvalidPublicKey(first)),
        },
    }
}

/// Bind `key` to `account`. Rebinding the same key is a no-op; replacing a
/// different key is refused.
pub fn bind_pub_key(account: &mut BaseAccount, key: &k256::PublicKey) -> Result<(), IdentityError> {
    let compressed = key.to_encoded_point(true).as_bytes().to_vec();
    match &account.pub_key {
        Some(existing) if existing.key != compressed => Err(IdentityError::InvalidPublicKey(
            format!("account {} already has a different public key", account.address),
        )),
        _ => {
            account.pub_key = Some(PubKey { key: compressed });
            Ok(())
        }
    }
}

/// Account ledger persisted in the module's own key/value store.
pub struct KvAccountKeeper {
    accounts: KeyedStore<StoredAccount>,
}

impl KvAccountKeeper {
    pub fn new() -> Self {
        Self {
            accounts: KeyedStore::new(ACCOUNT_NAMESPACE),
        }
    }

    fn next_account_number<S: KvStore + ?Sized>(&self, kv: &mut S) -> Result<u64, StoreError> {
        let current = match kv.get(ACCOUNT_NUMBER_KEY)? {
            None => 0,
            Some(bz) => std::str::from_utf8(&bz)
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .ok_or_else(|| StoreError::CounterCorruption {
                    namespace: "AccountNumber/".into(),
                    raw: String::from_utf8_lossy(&bz).into_owned(),
                })?,
        };
        kv.set(ACCOUNT_NUMBER_KEY, (current + 1).to_string().as_bytes())?;
        Ok(current)
    }
}

impl Default for KvAccountKeeper {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountKeeper for KvAccountKeeper {
    fn new_account_with_address<S: KvStore + ?Sized>(
        &self,
        kv: &mut S,
        address: &AccAddress,
    ) -> Result<Account, IdentityError> {
        let key = address.to_hex();
        if self.accounts.has(kv, &key)? {
            return Err(IdentityError::AlreadyExists(format!(
                "account {} already exists",
                key
            )));
        }
        let account_number = self.next_account_number(kv)?;
        Ok(Account::Base(BaseAccount {
            address: key,
            pub_key: None,
            account_number,
            sequence: 0,
        }))
    }

    fn set_account<S: KvStore + ?Sized>(
        &self,
        kv: &mut S,
        account: Account,
    ) -> Result<(), IdentityError> {
        let key = account_address(&account).to_string();
        if key.is_empty() {
            return Err(IdentityError::InvalidArgument(
                "account has no address".into(),
            ));
        }
        self.accounts.set(
            kv,
            &key,
            &StoredAccount {
                account: Some(account),
            },
        )?;
        Ok(())
    }

    fn get_account<S: KvStore + ?Sized>(
        &self,
        kv: &S,
        address: &AccAddress,
    ) -> Result<Option<Account>, IdentityError> {
        Ok(self
            .accounts
            .get(kv, &address.to_hex())?
            .and_then(|stored| stored.account))
    }
}
