//! Mises Identity Layer
//!
//! State transitions and queries for the identity module:
//! - DID to address derivation
//! - Account ledger (base accounts with a bound secp256k1 key)
//! - DID registration: account + registry record + profile + binding,
//!   committed as one unit of work
//! - Profile and relation updates
//! - Read-only query surface consumed by the RPC layer

pub mod account;
pub mod address;
pub mod error;
pub mod keeper;
pub mod msg_server;
pub mod query;
pub mod telemetry;

pub use account::{bind_pub_key, decode_pub_key, Account, AccountKeeper, KvAccountKeeper};
pub use address::addr_from_did;
pub use error::IdentityError;
pub use keeper::{Keeper, KeeperParams};
pub use telemetry::{MetricsRegistry, NoopTelemetry, Pending, Signal, Telemetry};
