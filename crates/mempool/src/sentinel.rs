//! Registration with an external sentinel relay.
//!
//! Validators running the sidecar announce their peer to the sentinel that
//! feeds them bundles. The registration is a single fire-and-forget
//! JSON-RPC POST; failures are logged and never surfaced, and the call
//! must not block node startup.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

/// Parameters for registering this validator's peer with a sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Sentinel endpoint URL
    pub url: String,
    /// API key identifying the validator with the sentinel operator
    pub api_key: String,
    /// Validator address, hex encoded
    pub validator_addr: String,
    /// Node peer id advertised to the sentinel
    pub peer_id: String,
    /// Address receiving auction payments
    pub payment_addr: String,
}

fn registration_body(config: &SentinelConfig) -> serde_json::Value {
    json!({
        "id": 1,
        "method": "register_peer",
        "params": [
            config.api_key,
            config.validator_addr,
            config.peer_id,
            config.payment_addr,
        ],
    })
}

/// Spawns a background registration request and returns immediately.
///
/// The outcome is only logged. Must be called from within a tokio runtime.
pub fn register_peer(config: SentinelConfig) {
    let body = registration_body(&config);
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        match client.post(&config.url).json(&body).send().await {
            Ok(response) => {
                debug!(status = %response.status(), url = %config.url, "registered with sentinel");
            }
            Err(err) => {
                warn!(error = %err, url = %config.url, "sentinel registration failed");
            }
        }
    });
}
