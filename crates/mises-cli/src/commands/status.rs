//! `mises status`: query the status of a running Mises node.

use clap::Args;
use serde::Deserialize;

use super::DEFAULT_ENDPOINT;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    version: String,
    applied_msgs: u64,
    uptime_secs: u64,
}

pub async fn run(args: &StatusArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/status", args.endpoint);
    let resp = reqwest::get(&url).await;

    match resp {
        Ok(r) if r.status().is_success() => {
            let status: StatusResponse = r.json().await?;
            println!("Node Status:");
            println!("  Version:   {}", status.version);
            println!("  Applied:   {} msgs", status.applied_msgs);
            println!("  Uptime:    {}s", status.uptime_secs);
        }
        Ok(r) => return Err(super::fail("status", r).await),
        Err(e) => super::unreachable(&args.endpoint, &e),
    }

    Ok(())
}
