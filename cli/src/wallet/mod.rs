//! Signing identity plus the network it is attached to.

pub mod keypair;
pub mod memory;

pub use keypair::KeypairWallet;
pub use memory::MemoryWallet;

use std::{fmt, sync::Arc};

use anchor_client::solana_sdk::pubkey::Pubkey;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::{error::WalletError, ledger::LedgerClient};

/// Identifies a cluster by its genesis hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NetworkId(String);

impl NetworkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a successful connect: who signs, where, and a ledger bound to both.
#[derive(Clone)]
pub struct Session {
    pub identity: Pubkey,
    pub network: NetworkId,
    pub ledger: Arc<dyn LedgerClient>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletEvent {
    /// `None` when the wallet no longer exposes an identity.
    IdentityChanged(Option<Pubkey>),
    NetworkChanged(NetworkId),
}

#[async_trait]
pub trait Wallet: Send + Sync {
    async fn connect(&self) -> Result<Session, WalletError>;

    /// Fails with [`WalletError::UnknownNetwork`] if the network was never registered.
    async fn switch_network(&self, network: &NetworkId) -> Result<(), WalletError>;

    async fn add_network(&self, network: &NetworkId, rpc_url: &str) -> Result<(), WalletError>;

    /// Asks the holder of `identity` to sign a vote. May be declined.
    async fn approve_vote(
        &self,
        identity: &Pubkey,
        candidate_id: u64,
        candidate_name: Option<&str>,
    ) -> Result<(), WalletError>;

    fn events(&self) -> broadcast::Receiver<WalletEvent>;
}
