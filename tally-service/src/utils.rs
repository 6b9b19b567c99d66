//! Shared utility functions for the tally service

use voting_cli::{ClientConfig, NetworkId};

/// Parse an environment variable into a type implementing FromStr, with a default fallback
pub fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Client settings from the environment. The service never prompts for signatures.
pub fn client_config_from_env() -> ClientConfig {
    let defaults = ClientConfig::default();
    ClientConfig {
        keypair_path: env_parse("KEYPAIR_PATH", defaults.keypair_path),
        rpc_url: env_parse("RPC_URL", defaults.rpc_url),
        ws_url: std::env::var("WS_URL").ok(),
        target_network: NetworkId::new(env_parse(
            "TARGET_NETWORK",
            defaults.target_network.to_string(),
        )),
        target_rpc_url: env_parse("TARGET_RPC_URL", defaults.target_rpc_url),
        micro_lamports: std::env::var("MICRO_LAMPORTS")
            .ok()
            .and_then(|v| v.parse().ok()),
        interactive: false,
        commitment: defaults.commitment,
    }
}
