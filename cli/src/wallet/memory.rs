use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use anchor_client::solana_sdk::pubkey::Pubkey;
use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{NetworkId, Session, Wallet, WalletEvent};
use crate::{error::WalletError, ledger::InMemoryLedger};

/// Scriptable wallet over an [`InMemoryLedger`]. Identity and network changes
/// are driven by the caller and announced the way a real wallet would.
pub struct MemoryWallet {
    ledger: Arc<InMemoryLedger>,
    identity: Mutex<Option<Pubkey>>,
    network: Mutex<NetworkId>,
    networks: Mutex<HashSet<NetworkId>>,
    decline_votes: AtomicBool,
    approval_delay: Mutex<Option<Duration>>,
    events: broadcast::Sender<WalletEvent>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryWallet {
    pub fn new(ledger: Arc<InMemoryLedger>, network: NetworkId) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            ledger,
            identity: Mutex::new(None),
            networks: Mutex::new(HashSet::from([network.clone()])),
            network: Mutex::new(network),
            decline_votes: AtomicBool::new(false),
            approval_delay: Mutex::new(None),
            events,
        }
    }

    pub fn with_identity(self, identity: Pubkey) -> Self {
        *lock(&self.identity) = Some(identity);
        self
    }

    /// Account switch or lock in the wallet.
    pub fn set_identity(&self, identity: Option<Pubkey>) {
        *lock(&self.identity) = identity;
        let _ = self.events.send(WalletEvent::IdentityChanged(identity));
    }

    /// Network switch made by the user outside the client.
    pub fn set_network(&self, network: NetworkId) {
        lock(&self.networks).insert(network.clone());
        *lock(&self.network) = network.clone();
        let _ = self.events.send(WalletEvent::NetworkChanged(network));
    }

    pub fn set_decline_votes(&self, decline: bool) {
        self.decline_votes.store(decline, Ordering::SeqCst);
    }

    /// Time the holder takes before answering a signing request.
    pub fn set_approval_delay(&self, delay: Option<Duration>) {
        *lock(&self.approval_delay) = delay;
    }

    pub fn network(&self) -> NetworkId {
        lock(&self.network).clone()
    }

    pub fn knows_network(&self, network: &NetworkId) -> bool {
        lock(&self.networks).contains(network)
    }
}

#[async_trait]
impl Wallet for MemoryWallet {
    async fn connect(&self) -> Result<Session, WalletError> {
        let identity = (*lock(&self.identity)).ok_or(WalletError::NoIdentity)?;
        Ok(Session {
            identity,
            network: self.network(),
            ledger: self.ledger.clone(),
        })
    }

    async fn switch_network(&self, network: &NetworkId) -> Result<(), WalletError> {
        if !self.knows_network(network) {
            return Err(WalletError::UnknownNetwork(network.clone()));
        }
        self.set_network(network.clone());
        Ok(())
    }

    async fn add_network(&self, network: &NetworkId, _rpc_url: &str) -> Result<(), WalletError> {
        lock(&self.networks).insert(network.clone());
        Ok(())
    }

    async fn approve_vote(
        &self,
        _identity: &Pubkey,
        _candidate_id: u64,
        _candidate_name: Option<&str>,
    ) -> Result<(), WalletError> {
        let delay = *lock(&self.approval_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.decline_votes.load(Ordering::SeqCst) {
            Err(WalletError::Declined)
        } else {
            Ok(())
        }
    }

    fn events(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}
