//! `mises follow` / `mises unfollow`: edit a follow edge.

use clap::Args;
use mises_core::{MsgUpdateUserRelation, RelationAction};

use super::DEFAULT_ENDPOINT;

#[derive(Args, Debug)]
pub struct FollowArgs {
    /// The follower's mises id.
    pub from: String,

    /// The followed user's mises id.
    pub to: String,

    /// Account that owns the follower's profile.
    #[arg(short, long)]
    pub creator: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

pub async fn run(args: &FollowArgs, action: RelationAction) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/relations", args.endpoint);
    let body = MsgUpdateUserRelation {
        creator: args.creator.clone(),
        uid_from: args.from.clone(),
        uid_to: args.to.clone(),
        action,
        version: 0,
    };

    let client = reqwest::Client::new();
    let resp = client.post(&url).json(&body).send().await;

    match resp {
        Ok(r) if r.status().is_success() => {
            println!("Relation updated!");
            println!("  {} {} {}", body.uid_from, action, body.uid_to);
        }
        Ok(r) => return Err(super::fail(&action.to_string(), r).await),
        Err(e) => super::unreachable(&args.endpoint, &e),
    }

    Ok(())
}
