//! `mises register`: register a DID with the node.

use clap::Args;
use mises_core::{Did, MsgCreateDidRegistry};
use std::path::PathBuf;

use super::DEFAULT_ENDPOINT;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// DID to register, e.g. did:mises:user:alice.
    pub did: String,

    /// Account that submits the registration.
    #[arg(short, long)]
    pub creator: String,

    /// Key file written by `mises init`.
    #[arg(short, long, conflicts_with = "pkey_multibase")]
    pub key_file: Option<PathBuf>,

    /// Base58 public key, when the key lives elsewhere.
    #[arg(long)]
    pub pkey_multibase: Option<String>,

    /// Verification method type of the key.
    #[arg(long, default_value = "EcdsaSecp256k1VerificationKey2019")]
    pub pkey_type: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

/// Assemble the registration message from the arguments.
pub fn build_msg(args: &RegisterArgs) -> anyhow::Result<MsgCreateDidRegistry> {
    let did = Did::new(&args.did)?;
    let pkey_multibase = match (&args.key_file, &args.pkey_multibase) {
        (Some(path), _) => super::init::pkey_multibase(&super::init::load_key(path)?),
        (None, Some(encoded)) => encoded.clone(),
        (None, None) => anyhow::bail!("either --key-file or --pkey-multibase is required"),
    };

    Ok(MsgCreateDidRegistry {
        creator: args.creator.clone(),
        did: did.uri().to_string(),
        pkey_did: format!("{}#key0", did),
        pkey_type: args.pkey_type.clone(),
        pkey_multibase,
        version: 0,
    })
}

pub async fn run(args: &RegisterArgs) -> anyhow::Result<()> {
    let msg = build_msg(args)?;
    let url = format!("{}/api/v1/did", args.endpoint);

    let client = reqwest::Client::new();
    let resp = client.post(&url).json(&msg).send().await;

    match resp {
        Ok(r) if r.status().is_success() => {
            println!("DID registered!");
            println!("  DID:        {}", msg.did);
            println!("  Key:        {}", msg.pkey_did);
            println!("  Public key: {}", msg.pkey_multibase);
        }
        Ok(r) => return Err(super::fail("registration", r).await),
        Err(e) => super::unreachable(&args.endpoint, &e),
    }

    Ok(())
}
