use anchor_lang::prelude::*;

/// Per-voter record. An identity without a record has not voted.
#[account]
#[derive(InitSpace, Debug, Default, PartialEq, Eq)]
pub struct VoterRecord {
    /// The voter this record belongs to
    pub voter: Pubkey,
    /// Set once, never cleared
    pub has_voted: bool,
    /// Candidate that received the vote
    pub candidate_id: u64,
    /// Slot the vote landed in
    pub slot_voted: u64,
    /// Bump seed for the PDA
    pub bump: u8,
}

impl VoterRecord {
    pub fn pda(voter: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[b"VoterRecord", voter.as_ref()], &crate::ID)
    }

    pub(crate) fn mark_voted(&mut self, voter: Pubkey, candidate_id: u64, slot: u64) {
        self.voter = voter;
        self.has_voted = true;
        self.candidate_id = candidate_id;
        self.slot_voted = slot;
    }
}
