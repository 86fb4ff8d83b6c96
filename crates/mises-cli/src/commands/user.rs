//! `mises user`: show a user profile.

use clap::Args;
use mises_core::QueryUserResponse;

use super::DEFAULT_ENDPOINT;

#[derive(Args, Debug)]
pub struct UserArgs {
    /// The user's mises id.
    pub mises_id: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

pub async fn run(args: &UserArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/user/{}", args.endpoint, args.mises_id);
    let resp = reqwest::get(&url).await;

    match resp {
        Ok(r) if r.status().is_success() => {
            let data: QueryUserResponse = r.json().await?;
            println!("User: {}", args.mises_id);
            if data.pri_info.enc_data.is_empty() {
                println!("  Private data: (none)");
            } else {
                println!("  Private data: {}", data.pri_info.enc_data);
                println!("  IV:           {}", data.pri_info.iv);
            }
        }
        Ok(r) => return Err(super::fail("lookup", r).await),
        Err(e) => super::unreachable(&args.endpoint, &e),
    }

    Ok(())
}
