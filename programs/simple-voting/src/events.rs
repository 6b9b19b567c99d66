use anchor_lang::prelude::*;

/// Emitted once when the ballot is initialized.
#[event]
#[derive(Debug, Clone, PartialEq)]
pub struct Deployed {
    pub candidate_count: u64,
}

/// Emitted for every accepted vote.
#[event]
#[derive(Debug, Clone, PartialEq)]
pub struct VoteCast {
    pub voter: Pubkey,
    pub candidate_id: u64,
    pub candidate_name: String,
}
