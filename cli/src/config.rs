use std::path::PathBuf;

use anchor_client::solana_sdk::commitment_config::CommitmentConfig;

use crate::{
    consts::{TARGET_NETWORK, TARGET_RPC_URL},
    utils::websocket_url,
    wallet::NetworkId,
};

/// Settings shared by the command line and the tally service.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub keypair_path: PathBuf,
    pub rpc_url: String,
    pub ws_url: Option<String>,
    pub target_network: NetworkId,
    pub target_rpc_url: String,
    pub micro_lamports: Option<u64>,
    /// Prompt on stdin before signing a vote.
    pub interactive: bool,
    pub commitment: CommitmentConfig,
}

impl ClientConfig {
    pub fn ws_url(&self) -> String {
        self.ws_url
            .clone()
            .unwrap_or_else(|| websocket_url(&self.rpc_url))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            keypair_path: PathBuf::from("id.json"),
            rpc_url: "http://localhost:8899".to_string(),
            ws_url: None,
            target_network: NetworkId::new(TARGET_NETWORK),
            target_rpc_url: TARGET_RPC_URL.to_string(),
            micro_lamports: None,
            interactive: false,
            commitment: CommitmentConfig::confirmed(),
        }
    }
}
