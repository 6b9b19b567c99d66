use std::str::FromStr;

use anchor_client::solana_sdk::pubkey::Pubkey;

use crate::consts::MAX_CANDIDATE_NAME_LEN;

pub fn parse_pubkey(s: &str) -> Result<Pubkey, String> {
    Pubkey::from_str(s).map_err(|e| format!("invalid pubkey: {e}"))
}

pub fn parse_candidate_name(s: &str) -> Result<String, String> {
    let name = s.trim();
    if name.is_empty() {
        return Err("candidate name cannot be empty".to_string());
    }
    if name.len() > MAX_CANDIDATE_NAME_LEN {
        return Err(format!(
            "candidate name {name:?} is longer than {MAX_CANDIDATE_NAME_LEN} bytes"
        ));
    }
    Ok(name.to_string())
}

/// Derives the pubsub endpoint that pairs with an RPC endpoint.
/// A local validator serves websockets on the port after its RPC port.
pub fn websocket_url(rpc_url: &str) -> String {
    let ws = if let Some(rest) = rpc_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = rpc_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        rpc_url.to_string()
    };
    match ws.strip_suffix(":8899") {
        Some(host) => format!("{host}:8900"),
        None => ws,
    }
}
