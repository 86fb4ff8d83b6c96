use mises_core::types::ADDRESS_LEN;
use mises_core::{AccAddress, Did, DidType};

use crate::error::IdentityError;

/// Domain separation context for address derivation.
const ADDRESS_CONTEXT: &str = "mises-tm did address v1";

/// Derive the chain address and identity type of a DID.
///
/// Deterministic: the address is the first 20 bytes of a BLAKE3 key
/// derivation over the full DID URI.
pub fn addr_from_did(did: &str) -> Result<(AccAddress, DidType), IdentityError> {
    let did = Did::new(did)?;
    let did_type: DidType = did.kind().parse()?;

    let mut hasher = blake3::Hasher::new_derive_key(ADDRESS_CONTEXT);
    hasher.update(did.uri().as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&digest.as_bytes()[..ADDRESS_LEN]);
    Ok((AccAddress::from_bytes(bytes), did_type))
}
