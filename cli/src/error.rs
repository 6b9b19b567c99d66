use anchor_client::solana_sdk::pubkey::Pubkey;
use simple_voting::error::ErrorCode;
use thiserror::Error;

use crate::wallet::NetworkId;

/// Failures reported by a ledger channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ballot account not found, contract not deployed")]
    NotDeployed,

    #[error("You have already voted!")]
    AlreadyVoted,

    #[error("Invalid candidate ID! ({0})")]
    InvalidCandidate(u64),

    #[error("signer {signer} cannot vote as {voter}")]
    SignerMismatch { signer: Pubkey, voter: Pubkey },

    #[error("ledger unreachable: {0}")]
    Transport(String),

    #[error("transaction failed: {0}")]
    Transaction(String),
}

impl LedgerError {
    /// Maps a program error raised while applying a vote.
    pub fn from_program_error(err: anchor_lang::error::Error, candidate_id: u64) -> Self {
        match err {
            anchor_lang::error::Error::AnchorError(e)
                if e.error_code_number == u32::from(ErrorCode::AlreadyVoted) =>
            {
                LedgerError::AlreadyVoted
            }
            anchor_lang::error::Error::AnchorError(e)
                if e.error_code_number == u32::from(ErrorCode::InvalidCandidate) =>
            {
                LedgerError::InvalidCandidate(candidate_id)
            }
            other => LedgerError::Transaction(other.to_string()),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("wallet not available: {0}")]
    Unavailable(String),

    #[error("wallet has no signing identity")]
    NoIdentity,

    #[error("user rejected the request")]
    Declined,

    #[error("network {0} is not known to the wallet")]
    UnknownNetwork(NetworkId),
}

/// Outcome of a failed vote attempt, as shown to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VoteError {
    #[error("Please connect your wallet to vote")]
    NotConnected,

    #[error("You have already voted")]
    AlreadyVoted,

    #[error("Invalid candidate selected")]
    InvalidCandidate,

    #[error("Transaction was rejected")]
    UserDeclined,

    #[error("A vote is already being submitted")]
    SubmissionPending,

    #[error("Ledger unavailable: {0}")]
    TransportUnavailable(String),

    #[error("Failed to vote: {0}")]
    Unknown(String),
}

impl VoteError {
    /// Classifies a raw failure message from the ledger or wallet.
    /// Program errors surface either by name or as a custom program error code.
    pub fn classify(detail: &str) -> Self {
        let lower = detail.to_lowercase();
        let has_code = |code: ErrorCode| lower.contains(&format!("{:#x}", u32::from(code)));

        if lower.contains("alreadyvoted")
            || lower.contains("already voted")
            || has_code(ErrorCode::AlreadyVoted)
        {
            VoteError::AlreadyVoted
        } else if lower.contains("invalidcandidate")
            || lower.contains("invalid candidate")
            || has_code(ErrorCode::InvalidCandidate)
        {
            VoteError::InvalidCandidate
        } else if lower.contains("user rejected") {
            VoteError::UserDeclined
        } else if lower.contains("connection refused")
            || lower.contains("timed out")
            || lower.contains("error sending request")
        {
            VoteError::TransportUnavailable(detail.to_string())
        } else {
            VoteError::Unknown(detail.to_string())
        }
    }

    /// Short machine-readable tag.
    pub fn kind(&self) -> &'static str {
        match self {
            VoteError::NotConnected => "not_connected",
            VoteError::AlreadyVoted => "already_voted",
            VoteError::InvalidCandidate => "invalid_candidate",
            VoteError::UserDeclined => "user_declined",
            VoteError::SubmissionPending => "submission_pending",
            VoteError::TransportUnavailable(_) => "transport_unavailable",
            VoteError::Unknown(_) => "unknown",
        }
    }
}

impl From<LedgerError> for VoteError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AlreadyVoted => VoteError::AlreadyVoted,
            LedgerError::InvalidCandidate(_) => VoteError::InvalidCandidate,
            LedgerError::NotDeployed => {
                VoteError::TransportUnavailable("contract not deployed".to_string())
            }
            LedgerError::Transport(detail) => VoteError::TransportUnavailable(detail),
            LedgerError::Transaction(detail) => VoteError::classify(&detail),
            err @ LedgerError::SignerMismatch { .. } => VoteError::Unknown(err.to_string()),
        }
    }
}

impl From<WalletError> for VoteError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::Declined => VoteError::UserDeclined,
            WalletError::NoIdentity | WalletError::Unavailable(_) => VoteError::NotConnected,
            other => VoteError::Unknown(other.to_string()),
        }
    }
}
