use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use anchor_client::solana_sdk::{pubkey::Pubkey, signature::Signature};
use async_trait::async_trait;
use log::warn;
use simple_voting::{Ballot, Candidate, VoterRecord};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::{LedgerClient, VoteCastNotice, VoteCastSubscription};
use crate::error::LedgerError;

/// Process-local ledger that applies votes with the on-chain ballot logic.
/// Used by `simulate` and by tests, with switches to inject outages.
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    events: broadcast::Sender<VoteCastNotice>,
}

struct LedgerState {
    ballot: Option<Ballot>,
    voter_records: HashMap<Pubkey, VoterRecord>,
    slot: u64,
    reachable: bool,
}

impl LedgerState {
    fn ensure_reachable(&self) -> Result<(), LedgerError> {
        if self.reachable {
            Ok(())
        } else {
            Err(LedgerError::Transport("connection refused".to_string()))
        }
    }

    fn ballot(&self) -> Result<&Ballot, LedgerError> {
        self.ensure_reachable()?;
        self.ballot.as_ref().ok_or(LedgerError::NotDeployed)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    /// A ledger with no ballot deployed.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            state: Mutex::new(LedgerState {
                ballot: None,
                voter_records: HashMap::new(),
                slot: 0,
                reachable: true,
            }),
            events,
        }
    }

    pub fn with_candidates<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self, LedgerError> {
        let ledger = Self::new();
        ledger.deploy(Pubkey::default(), names)?;
        Ok(ledger)
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates the ballot. Returns the candidate count.
    pub fn deploy<S: Into<String>>(
        &self,
        authority: Pubkey,
        names: impl IntoIterator<Item = S>,
    ) -> Result<u64, LedgerError> {
        let mut state = self.lock();
        if state.ballot.is_some() {
            return Err(LedgerError::Transaction(
                "ballot account already in use".to_string(),
            ));
        }
        state.slot += 1;
        let mut ballot = Ballot::default();
        let count = ballot
            .initialize(
                authority,
                names.into_iter().map(Into::into).collect(),
                0,
                state.slot,
            )
            .map_err(|e| LedgerError::Transaction(e.to_string()))?;
        state.ballot = Some(ballot);
        Ok(count)
    }

    /// Simulates an outage: every call fails with a transport error while unset.
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }

    pub fn total_votes(&self) -> u64 {
        self.lock()
            .ballot
            .as_ref()
            .map(|b| b.all_candidates().iter().map(|c| c.vote_count).sum())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn candidate_count(&self) -> Result<u64, LedgerError> {
        Ok(self.lock().ballot()?.candidate_count())
    }

    async fn all_candidates(&self) -> Result<Vec<Candidate>, LedgerError> {
        Ok(self.lock().ballot()?.all_candidates().to_vec())
    }

    async fn candidate(&self, candidate_id: u64) -> Result<Candidate, LedgerError> {
        self.lock()
            .ballot()?
            .candidate(candidate_id)
            .cloned()
            .map_err(|_| LedgerError::InvalidCandidate(candidate_id))
    }

    async fn has_voted(&self, voter: &Pubkey) -> Result<bool, LedgerError> {
        let state = self.lock();
        state.ensure_reachable()?;
        Ok(state
            .voter_records
            .get(voter)
            .map(|r| r.has_voted)
            .unwrap_or(false))
    }

    async fn cast_vote(
        &self,
        voter: &Pubkey,
        candidate_id: u64,
    ) -> Result<Signature, LedgerError> {
        let (notice, slot) = {
            let mut guard = self.lock();
            guard.ensure_reachable()?;
            let slot = guard.slot + 1;
            let state = &mut *guard;
            let ballot = state.ballot.as_mut().ok_or(LedgerError::NotDeployed)?;
            let mut record = state.voter_records.get(voter).cloned().unwrap_or_default();

            let candidate_name = ballot
                .record_vote(&mut record, *voter, candidate_id, slot)
                .map_err(|e| LedgerError::from_program_error(e, candidate_id))?;
            state.voter_records.insert(*voter, record);
            state.slot = slot;

            let notice = VoteCastNotice {
                voter: *voter,
                candidate_id,
                candidate_name,
            };
            (notice, slot)
        };

        let _ = self.events.send(notice);
        Ok(signature_for_slot(slot))
    }

    async fn subscribe(&self) -> Result<VoteCastSubscription, LedgerError> {
        self.lock().ensure_reachable()?;

        let mut source = self.events.subscribe();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut cancel_rx => break,
                    event = source.recv() => match event {
                        Ok(event) => {
                            if events_tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("VoteCast subscriber lagged, skipped {skipped} events");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        Ok(VoteCastSubscription::new(events_rx, cancel_tx))
    }
}

/// Deterministic signature so results can be compared in tests.
fn signature_for_slot(slot: u64) -> Signature {
    let mut bytes = [0u8; 64];
    bytes[..8].copy_from_slice(&slot.to_le_bytes());
    Signature::from(bytes)
}
