use anchor_client::solana_sdk::signature::Signature;
use voting_cli::{LedgerError, VoteError};

/// Asserts that a ledger call failed and classifies to `expected`.
pub fn assert_vote_err(res: Result<Signature, LedgerError>, expected: VoteError) {
    let err = res.unwrap_err();
    assert_eq!(VoteError::from(err.clone()), expected, "ledger error: {err}");
}

pub fn assert_ledger_err<T: std::fmt::Debug>(res: Result<T, LedgerError>, msg: &str) {
    let err = res.unwrap_err().to_string();
    assert!(err.contains(msg), "{err:?} does not contain {msg:?}")
}

/// How a program error shows up in a failed transaction's message.
pub fn custom_error(code: simple_voting::error::ErrorCode) -> String {
    format!("custom program error: {:#x}", u32::from(code))
}
