//! `mises init`: generate the secp256k1 key that will control a new DID.

use clap::Args;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the hex-encoded secret key.
    #[arg(short, long, default_value = "mises_key.hex")]
    pub out: PathBuf,

    /// Overwrite an existing key file.
    #[arg(long)]
    pub force: bool,
}

/// Base58 encoding of the compressed public key, as sent in `pkey_multibase`.
pub fn pkey_multibase(secret: &k256::SecretKey) -> String {
    let public = secret.public_key();
    bs58::encode(public.to_encoded_point(true).as_bytes()).into_string()
}

/// Read a key written by `mises init`.
pub fn load_key(path: &Path) -> anyhow::Result<k256::SecretKey> {
    let contents = std::fs::read_to_string(path)?;
    let bytes = hex::decode(contents.trim())?;
    k256::SecretKey::from_slice(&bytes)
        .map_err(|_| anyhow::anyhow!("{} does not hold a secp256k1 secret key", path.display()))
}

pub fn run(args: &InitArgs) -> anyhow::Result<()> {
    if args.out.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            args.out.display()
        );
    }

    let secret = k256::SecretKey::random(&mut rand::rngs::OsRng);
    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&args.out, hex::encode(secret.to_bytes()))?;
    tracing::debug!(path = %args.out.display(), "key written");

    println!("Key generated!");
    println!("  Key file:        {}", args.out.display());
    println!("  Public key (b58): {}", pkey_multibase(&secret));
    println!();
    println!("Register a DID with:");
    println!(
        "  mises register did:mises:user:<id> --creator <address> --key-file {}",
        args.out.display()
    );
    Ok(())
}
