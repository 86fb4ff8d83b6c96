pub mod did;
pub mod follow;
pub mod init;
pub mod register;
pub mod relations;
pub mod status;
pub mod user;

use serde::Deserialize;

/// Default API endpoint of a local node.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:26657";

#[derive(Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Turn a non-success response into an error carrying the node's message.
pub async fn fail(action: &str, resp: reqwest::Response) -> anyhow::Error {
    let status = resp.status();
    match resp.json::<ErrorResponse>().await {
        Ok(err) => anyhow::anyhow!("{} failed (HTTP {}): {}", action, status, err.error),
        Err(_) => anyhow::anyhow!("{} failed (HTTP {})", action, status),
    }
}

pub fn unreachable(endpoint: &str, e: &reqwest::Error) {
    println!("Could not reach node at {}", endpoint);
    println!("  Error: {}", e);
    println!();
    println!("Is the node running? Start it with: mises-node");
}
