pub mod config;
pub mod consts;
pub mod error;
pub mod ledger;
pub mod notice;
pub mod snapshot;
pub mod sync;
pub mod utils;
pub mod wallet;

pub use config::ClientConfig;
pub use error::{LedgerError, VoteError, WalletError};
pub use ledger::{InMemoryLedger, LedgerClient, RpcLedger, VoteCastNotice, VoteCastSubscription};
pub use notice::{Notice, NoticeLevel};
pub use snapshot::{CandidateTally, Snapshot, SnapshotSource};
pub use sync::{ClientState, SubmitPhase, SyncConfig, Synchronizer};
pub use wallet::{KeypairWallet, MemoryWallet, NetworkId, Session, Wallet, WalletEvent};
