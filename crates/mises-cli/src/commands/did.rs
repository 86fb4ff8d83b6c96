//! `mises did`: show the DID registry record of a mises id.

use clap::Args;
use mises_core::QueryDidResponse;

use super::DEFAULT_ENDPOINT;

#[derive(Args, Debug)]
pub struct DidArgs {
    /// The mises id to look up.
    pub mises_id: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

pub async fn run(args: &DidArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/did/{}", args.endpoint, args.mises_id);
    let resp = reqwest::get(&url).await;

    match resp {
        Ok(r) if r.status().is_success() => {
            let data: QueryDidResponse = r.json().await?;
            let reg = data.did_registry;
            println!("DID:         {}", reg.did);
            println!("  Registry:  #{}", reg.id);
            println!("  Creator:   {}", reg.creator);
            println!("  Key:       {} ({})", reg.pkey_did, reg.pkey_type);
            println!("  Multibase: {}", reg.pkey_multibase);
            println!("  Version:   {}", reg.version);
        }
        Ok(r) => return Err(super::fail("lookup", r).await),
        Err(e) => super::unreachable(&args.endpoint, &e),
    }

    Ok(())
}
