use std::{
    collections::HashMap,
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anchor_client::{
    solana_client::nonblocking::rpc_client::RpcClient,
    solana_sdk::{
        commitment_config::CommitmentConfig, pubkey::Pubkey, signature::read_keypair_file,
        signer::Signer,
    },
    Cluster,
};
use async_trait::async_trait;
use log::{info, warn};
use tokio::sync::broadcast;

use super::{NetworkId, Session, Wallet, WalletEvent};
use crate::{config::ClientConfig, error::WalletError, ledger::RpcLedger, utils::websocket_url};

#[derive(Clone, Debug)]
struct Endpoint {
    rpc_url: String,
    ws_url: String,
}

/// Wallet backed by a keypair file and an RPC endpoint. Switching networks
/// repoints the wallet at the RPC endpoint registered for that network, once
/// the holder confirms on stdin.
pub struct KeypairWallet {
    keypair_path: PathBuf,
    commitment: CommitmentConfig,
    micro_lamports: Option<u64>,
    interactive: bool,
    endpoint: Mutex<Endpoint>,
    networks: Mutex<HashMap<NetworkId, String>>,
    events: broadcast::Sender<WalletEvent>,
}

impl KeypairWallet {
    pub fn new(config: &ClientConfig) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            keypair_path: config.keypair_path.clone(),
            commitment: config.commitment,
            micro_lamports: config.micro_lamports,
            interactive: config.interactive,
            endpoint: Mutex::new(Endpoint {
                rpc_url: config.rpc_url.clone(),
                ws_url: config.ws_url(),
            }),
            networks: Mutex::new(HashMap::new()),
            events,
        }
    }

    fn endpoint(&self) -> Endpoint {
        lock(&self.endpoint).clone()
    }

    /// Network id of the current endpoint. When the endpoint cannot be reached
    /// the network it was registered under is assumed.
    async fn detect_network(&self, rpc_url: &str) -> NetworkId {
        let client = RpcClient::new_with_commitment(rpc_url.to_string(), self.commitment);
        match client.get_genesis_hash().await {
            Ok(hash) => {
                let network = NetworkId::new(hash.to_string());
                lock(&self.networks).insert(network.clone(), rpc_url.to_string());
                network
            }
            Err(err) => {
                warn!("Failed to fetch genesis hash from {rpc_url}: {err}");
                lock(&self.networks)
                    .iter()
                    .find(|(_, url)| url.as_str() == rpc_url)
                    .map(|(network, _)| network.clone())
                    .unwrap_or_else(|| NetworkId::new(format!("unreachable:{rpc_url}")))
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Asks the key holder on stdin, anything but yes declines.
async fn confirm(prompt: String) -> Result<(), WalletError> {
    let approved = tokio::task::spawn_blocking(move || -> io::Result<bool> {
        let mut stdout = io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    })
    .await
    .map_err(|e| WalletError::Unavailable(e.to_string()))?
    .map_err(|e| WalletError::Unavailable(e.to_string()))?;

    if approved {
        Ok(())
    } else {
        Err(WalletError::Declined)
    }
}

#[async_trait]
impl Wallet for KeypairWallet {
    async fn connect(&self) -> Result<Session, WalletError> {
        let keypair = read_keypair_file(&self.keypair_path).map_err(|e| {
            WalletError::Unavailable(format!("{}: {e}", self.keypair_path.display()))
        })?;
        let identity = keypair.pubkey();
        let endpoint = self.endpoint();
        let network = self.detect_network(&endpoint.rpc_url).await;

        let ledger = RpcLedger::new(
            Cluster::Custom(endpoint.rpc_url.clone(), endpoint.ws_url),
            Arc::new(keypair),
            self.commitment,
            self.micro_lamports,
        )
        .map_err(|e| WalletError::Unavailable(e.to_string()))?;

        info!("Wallet {identity} attached to {} ({network})", endpoint.rpc_url);
        Ok(Session {
            identity,
            network,
            ledger: Arc::new(ledger),
        })
    }

    /// Moving the signer to another cluster needs the holder's consent, a
    /// non-interactive wallet stays where it was configured.
    async fn switch_network(&self, network: &NetworkId) -> Result<(), WalletError> {
        let rpc_url = lock(&self.networks)
            .get(network)
            .cloned()
            .ok_or_else(|| WalletError::UnknownNetwork(network.clone()))?;

        if !self.interactive {
            info!("Not switching to {network} without an interactive wallet");
            return Err(WalletError::Declined);
        }
        confirm(format!("Switch wallet to network {network} at {rpc_url}? [y/N] ")).await?;

        *lock(&self.endpoint) = Endpoint {
            ws_url: websocket_url(&rpc_url),
            rpc_url,
        };
        let _ = self.events.send(WalletEvent::NetworkChanged(network.clone()));
        Ok(())
    }

    async fn add_network(&self, network: &NetworkId, rpc_url: &str) -> Result<(), WalletError> {
        info!("Registering network {network} at {rpc_url}");
        lock(&self.networks).insert(network.clone(), rpc_url.to_string());
        Ok(())
    }

    async fn approve_vote(
        &self,
        identity: &Pubkey,
        candidate_id: u64,
        candidate_name: Option<&str>,
    ) -> Result<(), WalletError> {
        if !self.interactive {
            return Ok(());
        }

        confirm(format!(
            "Sign vote for {} (#{candidate_id}) as {identity}? [y/N] ",
            candidate_name.unwrap_or("unknown candidate")
        ))
        .await
    }

    fn events(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{TARGET_NETWORK, TARGET_RPC_URL};

    #[tokio::test]
    async fn test_non_interactive_wallet_keeps_its_endpoint() {
        let config = ClientConfig::default();
        let wallet = KeypairWallet::new(&config);
        let mut events = wallet.events();
        let target = NetworkId::new(TARGET_NETWORK);

        assert_eq!(
            wallet.switch_network(&target).await,
            Err(WalletError::UnknownNetwork(target.clone()))
        );

        wallet.add_network(&target, TARGET_RPC_URL).await.unwrap();
        assert_eq!(
            wallet.switch_network(&target).await,
            Err(WalletError::Declined)
        );
        assert_eq!(wallet.endpoint().rpc_url, config.rpc_url);
        assert!(events.try_recv().is_err());
    }
}
