//! Read/write/subscribe access to the ballot.

pub mod memory;
pub mod rpc;

pub use memory::InMemoryLedger;
pub use rpc::RpcLedger;

use anchor_client::solana_sdk::{pubkey::Pubkey, signature::Signature};
use async_trait::async_trait;
use simple_voting::{Candidate, VoteCast};
use tokio::sync::{mpsc, oneshot};

use crate::error::LedgerError;

/// A `VoteCast` event observed on the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteCastNotice {
    pub voter: Pubkey,
    pub candidate_id: u64,
    pub candidate_name: String,
}

impl From<VoteCast> for VoteCastNotice {
    fn from(event: VoteCast) -> Self {
        Self {
            voter: event.voter,
            candidate_id: event.candidate_id,
            candidate_name: event.candidate_name,
        }
    }
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn candidate_count(&self) -> Result<u64, LedgerError>;

    async fn all_candidates(&self) -> Result<Vec<Candidate>, LedgerError>;

    async fn candidate(&self, candidate_id: u64) -> Result<Candidate, LedgerError>;

    async fn vote_count(&self, candidate_id: u64) -> Result<u64, LedgerError> {
        Ok(self.candidate(candidate_id).await?.vote_count)
    }

    async fn has_voted(&self, voter: &Pubkey) -> Result<bool, LedgerError>;

    /// Submits a vote signed by `voter` and waits for confirmation.
    async fn cast_vote(&self, voter: &Pubkey, candidate_id: u64)
        -> Result<Signature, LedgerError>;

    async fn subscribe(&self) -> Result<VoteCastSubscription, LedgerError>;
}

/// Stream of `VoteCast` events. Dropping it tears down the underlying subscription.
pub struct VoteCastSubscription {
    events: mpsc::UnboundedReceiver<VoteCastNotice>,
    cancel: Option<oneshot::Sender<()>>,
}

impl VoteCastSubscription {
    pub fn new(
        events: mpsc::UnboundedReceiver<VoteCastNotice>,
        cancel: oneshot::Sender<()>,
    ) -> Self {
        Self {
            events,
            cancel: Some(cancel),
        }
    }

    /// Next event, or `None` once the ledger side has closed.
    pub async fn next(&mut self) -> Option<VoteCastNotice> {
        self.events.recv().await
    }
}

impl Drop for VoteCastSubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}
