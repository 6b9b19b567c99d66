use std::sync::Arc;

use anchor_client::{
    solana_sdk::{
        commitment_config::CommitmentConfig,
        pubkey::Pubkey,
        signature::{Keypair, Signature},
        signer::Signer,
    },
    Client, ClientError, Cluster, EventContext, Program,
};
use async_trait::async_trait;
use log::{debug, info};
use simple_voting::{Ballot, Candidate, VoteCast, VoterRecord};
use tokio::sync::{mpsc, oneshot};

use super::{LedgerClient, VoteCastNotice, VoteCastSubscription};
use crate::{
    error::LedgerError,
    utils::{send_cast_vote, send_initialize, TxSender},
};

/// Ledger channel backed by a Solana RPC and pubsub endpoint.
pub struct RpcLedger {
    program: Arc<Program<Arc<Keypair>>>,
    payer: Arc<Keypair>,
    micro_lamports: Option<u64>,
}

impl RpcLedger {
    pub fn new(
        cluster: Cluster,
        payer: Arc<Keypair>,
        commitment: CommitmentConfig,
        micro_lamports: Option<u64>,
    ) -> Result<Self, LedgerError> {
        let client = Client::new_with_options(cluster, payer.clone(), commitment);
        let program = client
            .program(simple_voting::id())
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(Self {
            program: Arc::new(program),
            payer,
            micro_lamports,
        })
    }

    pub fn program(&self) -> &Program<Arc<Keypair>> {
        &self.program
    }

    pub fn tx_sender(&self) -> TxSender<'_> {
        TxSender {
            program: &self.program,
            micro_lamports: self.micro_lamports,
            payer: &self.payer,
        }
    }

    /// Creates the ballot. Only succeeds once per program deployment.
    pub async fn initialize(&self, candidate_names: Vec<String>) -> Result<Signature, LedgerError> {
        send_initialize(&self.tx_sender(), candidate_names)
            .await
            .map_err(|e| LedgerError::Transaction(e.to_string()))
    }

    pub async fn ballot(&self) -> Result<Ballot, LedgerError> {
        self.program
            .account::<Ballot>(Ballot::pda().0)
            .await
            .map_err(map_read_error)
    }
}

fn map_read_error(err: ClientError) -> LedgerError {
    match err {
        ClientError::AccountNotFound => LedgerError::NotDeployed,
        other => LedgerError::Transport(other.to_string()),
    }
}

#[async_trait]
impl LedgerClient for RpcLedger {
    async fn candidate_count(&self) -> Result<u64, LedgerError> {
        Ok(self.ballot().await?.candidate_count())
    }

    async fn all_candidates(&self) -> Result<Vec<Candidate>, LedgerError> {
        Ok(self.ballot().await?.candidates)
    }

    async fn candidate(&self, candidate_id: u64) -> Result<Candidate, LedgerError> {
        self.ballot()
            .await?
            .candidate(candidate_id)
            .cloned()
            .map_err(|_| LedgerError::InvalidCandidate(candidate_id))
    }

    async fn has_voted(&self, voter: &Pubkey) -> Result<bool, LedgerError> {
        match self
            .program
            .account::<VoterRecord>(VoterRecord::pda(voter).0)
            .await
        {
            Ok(record) => Ok(record.has_voted),
            Err(ClientError::AccountNotFound) => Ok(false),
            Err(err) => Err(LedgerError::Transport(err.to_string())),
        }
    }

    async fn cast_vote(
        &self,
        voter: &Pubkey,
        candidate_id: u64,
    ) -> Result<Signature, LedgerError> {
        let signer = self.payer.pubkey();
        if *voter != signer {
            return Err(LedgerError::SignerMismatch {
                signer,
                voter: *voter,
            });
        }

        let tx = send_cast_vote(&self.tx_sender(), *voter, candidate_id)
            .await
            .map_err(|e| LedgerError::Transaction(e.to_string()))?;
        info!("Transaction sent: {}", tx);
        Ok(tx)
    }

    async fn subscribe(&self) -> Result<VoteCastSubscription, LedgerError> {
        let program = Arc::clone(&self.program);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let (ready_tx, ready_rx) = oneshot::channel();

        // The unsubscriber borrows the program, so both live in this task.
        tokio::spawn(async move {
            let handler = move |ctx: &EventContext, event: VoteCast| {
                debug!("VoteCast in slot {} ({})", ctx.slot, ctx.signature);
                let _ = events_tx.send(VoteCastNotice::from(event));
            };
            match program.on::<VoteCast>(handler).await {
                Ok(unsubscriber) => {
                    let _ = ready_tx.send(Ok(()));
                    let _ = cancel_rx.await;
                    unsubscriber.unsubscribe().await;
                    debug!("VoteCast subscription closed");
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(LedgerError::Transport(err.to_string())));
                }
            }
        });

        ready_rx
            .await
            .map_err(|_| LedgerError::Transport("subscription task ended".to_string()))??;
        Ok(VoteCastSubscription::new(events_rx, cancel_tx))
    }
}
