//! Fixtures shared by the integration tests.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use mises_core::{MsgCreateDidRegistry, MsgUpdateUserRelation, RelationAction};
use std::path::PathBuf;

pub const CREATOR: &str = "mises1creator";

/// Deterministic secp256k1 public key, base58 encoded.
pub fn pkey_multibase(seed: u8) -> String {
    let secret = k256::SecretKey::from_slice(&[seed.max(1); 32])
        .unwrap_or_else(|e| panic!("seed {} is not a valid scalar: {}", seed, e));
    bs58::encode(secret.public_key().to_encoded_point(true).as_bytes()).into_string()
}

pub fn register_msg(did: &str, seed: u8) -> MsgCreateDidRegistry {
    MsgCreateDidRegistry {
        creator: CREATOR.into(),
        did: did.into(),
        pkey_did: format!("{}#key0", did),
        pkey_type: "EcdsaSecp256k1VerificationKey2019".into(),
        pkey_multibase: pkey_multibase(seed),
        version: 0,
    }
}

pub fn relation_msg(from: &str, to: &str, action: RelationAction) -> MsgUpdateUserRelation {
    MsgUpdateUserRelation {
        creator: CREATOR.into(),
        uid_from: from.into(),
        uid_to: to.into(),
        action,
        version: 0,
    }
}

/// Fresh directory under the system temp dir. Removed on drop.
pub struct TempDir(PathBuf);

impl TempDir {
    pub fn new(prefix: &str) -> Self {
        Self(std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::now_v7())))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.0
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.0).ok();
    }
}
