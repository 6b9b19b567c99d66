//! Keeps a local view of the ballot in step with the wallet and the ledger.
//!
//! State is published on a watch channel. Notices go out on a broadcast
//! channel and are never stored. Each wallet session carries a generation
//! number and results that belong to an older session are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use anchor_client::solana_sdk::{pubkey::Pubkey, signature::Signature};
use log::{debug, info, warn};
use serde::Serialize;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};

use crate::{
    config::ClientConfig,
    consts::{DEMO_MODE_ERROR, UNREACHABLE_DEMO_ERROR},
    error::{LedgerError, VoteError, WalletError},
    ledger::{LedgerClient, VoteCastNotice, VoteCastSubscription},
    notice::{Notice, NoticeLevel},
    snapshot::{CandidateTally, Snapshot, SnapshotSource},
    utils::short_address,
    wallet::{NetworkId, Session, Wallet, WalletEvent},
};

#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub target_network: NetworkId,
    pub target_rpc_url: String,
}

impl From<&ClientConfig> for SyncConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            target_network: config.target_network.clone(),
            target_rpc_url: config.target_rpc_url.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitPhase {
    Idle,
    Submitting,
}

/// Everything a front end needs to render the ballot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientState {
    pub candidates: Vec<CandidateTally>,
    pub total_votes: u64,
    pub has_voted: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub is_connected: bool,
    pub is_correct_network: bool,
    pub identity: Option<String>,
    pub source: SnapshotSource,
    pub phase: SubmitPhase,
}

struct ActiveSession {
    identity: Pubkey,
    network: NetworkId,
    ledger: Arc<dyn LedgerClient>,
}

#[derive(Default)]
struct Inner {
    generation: u64,
    session: Option<ActiveSession>,
    is_correct_network: bool,
    snapshot: Snapshot,
    error: Option<String>,
    refreshes_in_flight: usize,
    submitting: bool,
    listener: Option<JoinHandle<()>>,
}

impl Inner {
    fn client_state(&self) -> ClientState {
        ClientState {
            candidates: self.snapshot.candidates.clone(),
            total_votes: self.snapshot.total_votes,
            has_voted: self.snapshot.has_voted,
            is_loading: self.refreshes_in_flight > 0 || self.submitting,
            error: self.error.clone(),
            is_connected: self.session.is_some(),
            is_correct_network: self.is_correct_network,
            identity: self.session.as_ref().map(|s| s.identity.to_string()),
            source: self.snapshot.source,
            phase: if self.submitting {
                SubmitPhase::Submitting
            } else {
                SubmitPhase::Idle
            },
        }
    }
}

pub struct Synchronizer {
    wallet: Arc<dyn Wallet>,
    config: SyncConfig,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<ClientState>,
    notices: broadcast::Sender<Notice>,
}

impl Synchronizer {
    pub fn new(wallet: Arc<dyn Wallet>, config: SyncConfig) -> Arc<Self> {
        let inner = Inner::default();
        let (state_tx, _) = watch::channel(inner.client_state());
        let (notices, _) = broadcast::channel(64);
        Arc::new(Self {
            wallet,
            config,
            inner: Mutex::new(inner),
            state_tx,
            notices,
        })
    }

    pub fn state(&self) -> ClientState {
        self.state_tx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<ClientState> {
        self.state_tx.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn identity(&self) -> Option<Pubkey> {
        self.lock().session.as_ref().map(|s| s.identity)
    }

    pub fn is_connected(&self) -> bool {
        self.lock().session.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `f` to the inner state and publishes the result.
    fn update<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.lock();
        let result = f(&mut inner);
        self.state_tx.send_replace(inner.client_state());
        result
    }

    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!("{}: {}", notice.title, notice.message),
            NoticeLevel::Error => warn!("{}: {}", notice.title, notice.message),
        }
        let _ = self.notices.send(notice);
    }

    /// Connects the wallet, moves it to the target network if needed, then
    /// loads the ballot and starts listening for votes.
    pub async fn connect(self: &Arc<Self>) -> Result<(), WalletError> {
        self.connect_with(true).await
    }

    async fn connect_with(self: &Arc<Self>, switch_network: bool) -> Result<(), WalletError> {
        let mut session = match self.wallet.connect().await {
            Ok(session) => session,
            Err(err) => {
                self.update(|inner| inner.error = Some(err.to_string()));
                self.notify(Notice::error("Connection Failed", err.to_string()));
                return Err(err);
            }
        };

        if switch_network
            && session.network != self.config.target_network
            && self.switch_to_target().await.is_ok()
        {
            match self.wallet.connect().await {
                Ok(switched) => session = switched,
                Err(err) => warn!("Reconnect after network switch failed: {err}"),
            }
        }

        let is_correct_network = session.network == self.config.target_network;
        self.notify(Notice::info(
            "Wallet Connected",
            format!("Connected to {}", short_address(&session.identity)),
        ));
        if !is_correct_network {
            self.notify(Notice::error(
                "Wrong Network",
                format!("Please switch to {}", self.config.target_network),
            ));
        }

        self.install_session(session, is_correct_network).await;
        self.refresh().await;
        Ok(())
    }

    /// Asks the wallet to move to the target network, registering it first
    /// when the wallet does not know it.
    pub async fn switch_to_target(&self) -> Result<(), WalletError> {
        let target = &self.config.target_network;
        let result = match self.wallet.switch_network(target).await {
            Err(WalletError::UnknownNetwork(_)) => {
                info!("Wallet does not know {target}, registering it");
                match self
                    .wallet
                    .add_network(target, &self.config.target_rpc_url)
                    .await
                {
                    Ok(()) => self.wallet.switch_network(target).await,
                    Err(err) => Err(err),
                }
            }
            other => other,
        };

        if let Err(err) = &result {
            self.notify(Notice::error(
                "Network Switch Failed",
                format!("Please switch to {target} manually: {err}"),
            ));
        }
        result
    }

    async fn install_session(self: &Arc<Self>, session: Session, is_correct_network: bool) {
        let subscription = match session.ledger.subscribe().await {
            Ok(subscription) => Some(subscription),
            Err(err) => {
                warn!("VoteCast subscription unavailable: {err}");
                None
            }
        };

        self.update(|inner| {
            if let Some(listener) = inner.listener.take() {
                listener.abort();
            }
            inner.generation += 1;
            let generation = inner.generation;
            // A different network is a different ledger, its tallies do not carry over.
            let same_ballot = inner
                .session
                .as_ref()
                .is_some_and(|s| s.identity == session.identity && s.network == session.network);
            if !same_ballot {
                inner.snapshot = Snapshot::empty();
            }
            inner.session = Some(ActiveSession {
                identity: session.identity,
                network: session.network,
                ledger: session.ledger,
            });
            inner.is_correct_network = is_correct_network;
            inner.error = None;
            inner.listener = subscription.map(|s| self.spawn_listener(generation, s));
        });
    }

    fn spawn_listener(
        self: &Arc<Self>,
        generation: u64,
        mut subscription: VoteCastSubscription,
    ) -> JoinHandle<()> {
        let sync: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(event) = subscription.next().await {
                let Some(sync) = sync.upgrade() else {
                    break;
                };
                sync.on_vote_cast(generation, event).await;
            }
            debug!("VoteCast listener for session {generation} stopped");
        })
    }

    async fn on_vote_cast(&self, generation: u64, event: VoteCastNotice) {
        let current = self.lock().generation;
        if current != generation {
            return;
        }
        debug!(
            "{} voted for candidate {}",
            event.voter, event.candidate_id
        );
        self.notify(Notice::info(
            "New Vote Cast",
            format!("Someone voted for {}", event.candidate_name),
        ));
        self.refresh().await;
    }

    /// Drops the session and clears cached tallies.
    pub fn disconnect(&self) {
        let was_connected = self.update(|inner| {
            if let Some(listener) = inner.listener.take() {
                listener.abort();
            }
            inner.generation += 1;
            inner.snapshot = Snapshot::empty();
            inner.error = None;
            inner.is_correct_network = false;
            inner.session.take().is_some()
        });
        if was_connected {
            self.notify(Notice::info(
                "Wallet Disconnected",
                "Your wallet has been disconnected",
            ));
        }
    }

    /// Re-reads every candidate and the voted flag for the current identity.
    pub async fn load_state(&self) -> ClientState {
        self.refresh().await;
        self.state()
    }

    pub async fn refresh_data(&self) -> ClientState {
        self.load_state().await
    }

    async fn refresh(&self) {
        let Some((generation, identity, ledger)) = self.current_session() else {
            return;
        };
        let _loading = LoadingGuard::refresh(self);

        let result = tokio::try_join!(ledger.all_candidates(), ledger.has_voted(&identity));

        let demo_reason = self.update(|inner| {
            if inner.generation != generation {
                debug!("Discarding ballot read from session {generation}");
                return None;
            }
            match result {
                Ok((candidates, has_voted)) => {
                    inner.snapshot = Snapshot::live(candidates, has_voted);
                    inner.error = None;
                    None
                }
                Err(err) => {
                    warn!("Failed to load ballot state: {err}");
                    let not_deployed = matches!(err, LedgerError::NotDeployed);
                    if !not_deployed && inner.snapshot.has_ledger_data() {
                        inner.snapshot = std::mem::take(&mut inner.snapshot).into_stale();
                        inner.error = Some(format!("Showing last known results: {err}"));
                        return None;
                    }

                    let entering = inner.snapshot.source != SnapshotSource::Demo;
                    inner.snapshot = Snapshot::demo();
                    let reason = if not_deployed {
                        DEMO_MODE_ERROR
                    } else {
                        UNREACHABLE_DEMO_ERROR
                    };
                    inner.error = Some(reason.to_string());
                    entering.then_some(not_deployed)
                }
            }
        });

        match demo_reason {
            Some(true) => self.notify(Notice::info(
                "Demo Mode",
                "Contract not deployed. Using demo data for UI preview.",
            )),
            Some(false) => self.notify(Notice::info(
                "Demo Mode",
                "Ledger unreachable. Using demo data for UI preview.",
            )),
            None => {}
        }
    }

    fn current_session(&self) -> Option<(u64, Pubkey, Arc<dyn LedgerClient>)> {
        let inner = self.lock();
        inner
            .session
            .as_ref()
            .map(|s| (inner.generation, s.identity, s.ledger.clone()))
    }

    fn current_network(&self) -> Option<NetworkId> {
        self.lock().session.as_ref().map(|s| s.network.clone())
    }

    /// Casts a vote for `candidate_id` as the connected identity.
    ///
    /// Rejected locally without touching the ledger when no wallet is
    /// connected, when the cached state already shows a vote, or while another
    /// submission is in flight. The cached snapshot is only replaced by the
    /// refresh that follows a confirmed vote.
    pub async fn vote(&self, candidate_id: u64) -> Result<Signature, VoteError> {
        let checked = self.update(|inner| -> Result<_, VoteError> {
            let session = inner.session.as_ref().ok_or(VoteError::NotConnected)?;
            if inner.snapshot.has_voted {
                return Err(VoteError::AlreadyVoted);
            }
            if inner.submitting {
                return Err(VoteError::SubmissionPending);
            }
            let ready = (
                session.identity,
                session.ledger.clone(),
                inner
                    .snapshot
                    .candidate(candidate_id)
                    .map(|c| c.name.clone()),
            );
            inner.submitting = true;
            Ok(ready)
        });

        let (identity, ledger, candidate_name) = match checked {
            Ok(ready) => ready,
            Err(err) => {
                self.notify(Notice::error(rejection_title(&err), err.to_string()));
                return Err(err);
            }
        };
        let _submission = LoadingGuard::submission(self);

        let label = candidate_name
            .clone()
            .unwrap_or_else(|| format!("candidate #{candidate_id}"));
        let result = self
            .submit(&identity, ledger.as_ref(), candidate_id, candidate_name.as_deref())
            .await;

        match result {
            Ok(signature) => {
                info!("Vote for {label} confirmed in {signature}");
                self.notify(Notice::info(
                    "Vote Successful!",
                    format!("Your vote for {label} has been recorded"),
                ));
                self.refresh().await;
                Ok(signature)
            }
            Err(err) => {
                self.notify(Notice::error("Vote Failed", err.to_string()));
                Err(err)
            }
        }
    }

    async fn submit(
        &self,
        identity: &Pubkey,
        ledger: &dyn LedgerClient,
        candidate_id: u64,
        candidate_name: Option<&str>,
    ) -> Result<Signature, VoteError> {
        self.wallet
            .approve_vote(identity, candidate_id, candidate_name)
            .await?;
        self.notify(Notice::info(
            "Transaction Submitted",
            "Your vote is being processed...",
        ));
        Ok(ledger.cast_vote(identity, candidate_id).await?)
    }

    /// Follows identity and network changes reported by the wallet.
    pub fn watch_wallet(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.wallet.events();
        let sync = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Missed {skipped} wallet events");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let Some(sync) = sync.upgrade() else {
                    break;
                };
                sync.handle_wallet_event(event).await;
            }
        })
    }

    pub async fn handle_wallet_event(self: &Arc<Self>, event: WalletEvent) {
        match event {
            WalletEvent::IdentityChanged(None) => self.disconnect(),
            WalletEvent::IdentityChanged(Some(identity)) => {
                if self.identity() == Some(identity) {
                    return;
                }
                info!("Wallet identity changed to {identity}");
                if let Err(err) = self.connect_with(false).await {
                    debug!("Reconnect after identity change failed: {err}");
                }
            }
            WalletEvent::NetworkChanged(network) => {
                if !self.is_connected() || self.current_network().as_ref() == Some(&network) {
                    return;
                }
                info!("Wallet moved to network {network}");
                if let Err(err) = self.connect_with(false).await {
                    debug!("Reconnect after network change failed: {err}");
                }
            }
        }
    }
}

fn rejection_title(err: &VoteError) -> &'static str {
    match err {
        VoteError::NotConnected => "Wallet Required",
        VoteError::AlreadyVoted => "Already Voted",
        VoteError::SubmissionPending => "Vote Pending",
        _ => "Vote Failed",
    }
}

enum Loading {
    Refresh,
    Submission,
}

/// Keeps `is_loading` set for as long as it lives, including when the owning
/// future is dropped mid-flight.
struct LoadingGuard<'a> {
    sync: &'a Synchronizer,
    kind: Loading,
}

impl<'a> LoadingGuard<'a> {
    fn refresh(sync: &'a Synchronizer) -> Self {
        sync.update(|inner| inner.refreshes_in_flight += 1);
        Self {
            sync,
            kind: Loading::Refresh,
        }
    }

    /// The submitting flag is raised by the caller together with its checks.
    fn submission(sync: &'a Synchronizer) -> Self {
        Self {
            sync,
            kind: Loading::Submission,
        }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        match self.kind {
            Loading::Refresh => self.sync.update(|inner| {
                inner.refreshes_in_flight = inner.refreshes_in_flight.saturating_sub(1)
            }),
            Loading::Submission => self.sync.update(|inner| inner.submitting = false),
        }
    }
}
