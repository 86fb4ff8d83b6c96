//! `mises relations`: list the outgoing relations of a user.

use clap::Args;
use mises_core::QueryUserRelationResponse;

use super::DEFAULT_ENDPOINT;

#[derive(Args, Debug)]
pub struct RelationsArgs {
    /// The user's mises id.
    pub mises_id: String,

    /// Only list follows.
    #[arg(long)]
    pub following: bool,

    /// Resume after this DID (the previous page's next key).
    #[arg(long)]
    pub key: Option<String>,

    /// Page size.
    #[arg(short, long)]
    pub limit: Option<u64>,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

/// Query string for the relations endpoint.
pub fn query_params(args: &RelationsArgs) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if args.following {
        params.push(("filter", "following".to_string()));
    }
    if let Some(key) = &args.key {
        params.push(("key", key.clone()));
    }
    if let Some(limit) = args.limit {
        params.push(("limit", limit.to_string()));
    }
    params
}

pub async fn run(args: &RelationsArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/user/{}/relations", args.endpoint, args.mises_id);
    let client = reqwest::Client::new();
    let resp = client.get(&url).query(&query_params(args)).send().await;

    match resp {
        Ok(r) if r.status().is_success() => {
            let data: QueryUserRelationResponse = r.json().await?;
            if data.mises_list.is_empty() {
                println!("No relations found.");
            } else {
                for entry in &data.mises_list {
                    println!("  {}", entry.mises_id);
                }
                println!();
                println!("Next key: {}", data.pagination.next_key);
            }
        }
        Ok(r) => return Err(super::fail("relations query", r).await),
        Err(e) => super::unreachable(&args.endpoint, &e),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params() {
        let args = RelationsArgs {
            mises_id: "did:mises:user:a".into(),
            following: true,
            key: Some("did:mises:user:b".into()),
            limit: None,
            endpoint: DEFAULT_ENDPOINT.into(),
        };
        assert_eq!(
            query_params(&args),
            vec![
                ("filter", "following".to_string()),
                ("key", "did:mises:user:b".to_string())
            ]
        );
    }
}
