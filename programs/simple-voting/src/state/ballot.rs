use anchor_lang::prelude::*;

use crate::{error::ErrorCode, VoterRecord};

pub const MAX_CANDIDATES: usize = 16;
pub const MAX_CANDIDATE_NAME_LEN: usize = 32;

#[account]
#[derive(InitSpace, Debug, Default)]
pub struct Ballot {
    /// Bump seed for the PDA
    pub bump: u8,
    /// Wallet that deployed the ballot
    pub authority: Pubkey,
    /// Slot when this ballot was created
    pub slot_created: u64,
    /// Candidates ordered by id. The list is fixed after initialization.
    #[max_len(MAX_CANDIDATES)]
    pub candidates: Vec<Candidate>,
}

/// Inner struct of Ballot
#[derive(Debug, AnchorSerialize, AnchorDeserialize, Clone, InitSpace, PartialEq, Eq)]
pub struct Candidate {
    /// Position of the candidate within the ballot
    pub id: u64,
    #[max_len(MAX_CANDIDATE_NAME_LEN)]
    pub name: String,
    pub vote_count: u64,
}

impl Ballot {
    pub fn pda() -> (Pubkey, u8) {
        Pubkey::find_program_address(&[b"Ballot"], &crate::ID)
    }

    /// Fills an empty ballot with zero-count candidates. Returns the candidate count.
    pub fn initialize(
        &mut self,
        authority: Pubkey,
        candidate_names: Vec<String>,
        bump: u8,
        slot: u64,
    ) -> Result<u64> {
        require!(!candidate_names.is_empty(), ErrorCode::NoCandidates);
        require!(
            candidate_names.len() <= MAX_CANDIDATES,
            ErrorCode::TooManyCandidates
        );
        require!(
            candidate_names
                .iter()
                .all(|name| name.len() <= MAX_CANDIDATE_NAME_LEN),
            ErrorCode::CandidateNameTooLong
        );

        self.bump = bump;
        self.authority = authority;
        self.slot_created = slot;
        self.candidates = candidate_names
            .into_iter()
            .enumerate()
            .map(|(id, name)| Candidate {
                id: id as u64,
                name,
                vote_count: 0,
            })
            .collect();

        Ok(self.candidate_count())
    }

    pub fn candidate_count(&self) -> u64 {
        self.candidates.len() as u64
    }

    pub fn candidate(&self, candidate_id: u64) -> Result<&Candidate> {
        usize::try_from(candidate_id)
            .ok()
            .and_then(|idx| self.candidates.get(idx))
            .ok_or_else(|| error!(ErrorCode::InvalidCandidate))
    }

    pub fn vote_count(&self, candidate_id: u64) -> Result<u64> {
        Ok(self.candidate(candidate_id)?.vote_count)
    }

    pub fn all_candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Records a vote from `voter`. Every check runs before the first write, so a
    /// rejected vote leaves both the ballot and the voter record untouched.
    /// Returns the name of the candidate that received the vote.
    pub fn record_vote(
        &mut self,
        voter_record: &mut VoterRecord,
        voter: Pubkey,
        candidate_id: u64,
        slot: u64,
    ) -> Result<String> {
        require!(!voter_record.has_voted, ErrorCode::AlreadyVoted);

        let idx = usize::try_from(candidate_id)
            .ok()
            .filter(|idx| *idx < self.candidates.len())
            .ok_or_else(|| error!(ErrorCode::InvalidCandidate))?;
        let new_count = self.candidates[idx]
            .vote_count
            .checked_add(1)
            .ok_or_else(|| error!(ErrorCode::TallyOverflow))?;

        let candidate = &mut self.candidates[idx];
        candidate.vote_count = new_count;
        voter_record.mark_voted(voter, candidate_id, slot);

        Ok(candidate.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn reference_ballot() -> Ballot {
        let mut ballot = Ballot::default();
        ballot
            .initialize(
                Pubkey::new_unique(),
                vec![
                    "Candidate A".to_string(),
                    "Candidate B".to_string(),
                    "Candidate C".to_string(),
                ],
                255,
                1,
            )
            .unwrap();
        ballot
    }

    fn assert_error_code(err: anchor_lang::error::Error, expected: ErrorCode) {
        match err {
            anchor_lang::error::Error::AnchorError(e) => {
                assert_eq!(e.error_code_number, u32::from(expected))
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    fn tallies(ballot: &Ballot) -> Vec<u64> {
        ballot.all_candidates().iter().map(|c| c.vote_count).collect()
    }

    #[test]
    fn test_initialize_reference_ballot() {
        let ballot = reference_ballot();
        assert_eq!(ballot.candidate_count(), 3);
        assert_eq!(ballot.bump, 255);
        assert_eq!(ballot.slot_created, 1);
        for (idx, candidate) in ballot.all_candidates().iter().enumerate() {
            assert_eq!(candidate.id, idx as u64);
            assert_eq!(candidate.vote_count, 0);
        }
        assert_eq!(ballot.candidate(0).unwrap().name, "Candidate A");
        assert_eq!(ballot.candidate(1).unwrap().name, "Candidate B");
        assert_eq!(ballot.candidate(2).unwrap().name, "Candidate C");
    }

    #[test]
    fn test_initialize_rejects_bad_candidate_lists() {
        let mut ballot = Ballot::default();
        let err = ballot
            .initialize(Pubkey::new_unique(), vec![], 0, 0)
            .unwrap_err();
        assert_error_code(err, ErrorCode::NoCandidates);

        let too_many = (0..=MAX_CANDIDATES).map(|i| format!("C{i}")).collect();
        let err = ballot
            .initialize(Pubkey::new_unique(), too_many, 0, 0)
            .unwrap_err();
        assert_error_code(err, ErrorCode::TooManyCandidates);

        let long_name = vec!["x".repeat(MAX_CANDIDATE_NAME_LEN + 1)];
        let err = ballot
            .initialize(Pubkey::new_unique(), long_name, 0, 0)
            .unwrap_err();
        assert_error_code(err, ErrorCode::CandidateNameTooLong);

        assert!(ballot.candidates.is_empty());
    }

    #[test]
    fn test_single_candidate_ballot() {
        let mut ballot = Ballot::default();
        ballot
            .initialize(Pubkey::new_unique(), vec!["Only".to_string()], 0, 0)
            .unwrap();
        let mut record = VoterRecord::default();
        let name = ballot
            .record_vote(&mut record, Pubkey::new_unique(), 0, 5)
            .unwrap();
        assert_eq!(name, "Only");
        assert_eq!(ballot.vote_count(0).unwrap(), 1);
    }

    #[test]
    fn test_reference_scenario() {
        let mut ballot = reference_ballot();
        let x = Pubkey::new_unique();
        let y = Pubkey::new_unique();
        let mut record_x = VoterRecord::default();
        let mut record_y = VoterRecord::default();

        let name = ballot.record_vote(&mut record_x, x, 0, 10).unwrap();
        assert_eq!(name, "Candidate A");
        assert_eq!(ballot.vote_count(0).unwrap(), 1);
        assert!(record_x.has_voted);
        assert_eq!(record_x.voter, x);
        assert_eq!(record_x.candidate_id, 0);
        assert_eq!(record_x.slot_voted, 10);

        ballot.record_vote(&mut record_y, y, 0, 11).unwrap();
        assert_eq!(ballot.vote_count(0).unwrap(), 2);

        let err = ballot.record_vote(&mut record_x, x, 1, 12).unwrap_err();
        assert_error_code(err, ErrorCode::AlreadyVoted);
        assert_eq!(ballot.vote_count(1).unwrap(), 0);
        assert_eq!(record_x.candidate_id, 0);
        assert_eq!(record_x.slot_voted, 10);
    }

    #[test]
    fn test_invalid_candidate_leaves_state_unchanged() {
        let mut ballot = reference_ballot();
        let mut record = VoterRecord::default();
        ballot
            .record_vote(&mut VoterRecord::default(), Pubkey::new_unique(), 2, 1)
            .unwrap();
        let before = tallies(&ballot);

        for bad_id in [3, 5, u64::MAX] {
            let err = ballot
                .record_vote(&mut record, Pubkey::new_unique(), bad_id, 2)
                .unwrap_err();
            assert_error_code(err, ErrorCode::InvalidCandidate);
            assert_eq!(tallies(&ballot), before);
            assert!(!record.has_voted);
        }
    }

    #[test]
    fn test_already_voted_checked_before_candidate_range() {
        let mut ballot = reference_ballot();
        let voter = Pubkey::new_unique();
        let mut record = VoterRecord::default();
        ballot.record_vote(&mut record, voter, 1, 1).unwrap();

        let err = ballot.record_vote(&mut record, voter, 5, 2).unwrap_err();
        assert_error_code(err, ErrorCode::AlreadyVoted);
    }

    #[test]
    fn test_overflow_rejected_without_side_effects() {
        let mut ballot = reference_ballot();
        ballot.candidates[1].vote_count = u64::MAX;
        let mut record = VoterRecord::default();

        let err = ballot
            .record_vote(&mut record, Pubkey::new_unique(), 1, 1)
            .unwrap_err();
        assert_error_code(err, ErrorCode::TallyOverflow);
        assert_eq!(ballot.vote_count(1).unwrap(), u64::MAX);
        assert!(!record.has_voted);
    }

    #[test]
    fn test_read_out_of_range() {
        let ballot = reference_ballot();
        assert_error_code(ballot.vote_count(5).unwrap_err(), ErrorCode::InvalidCandidate);
        assert_error_code(
            ballot.candidate(3).unwrap_err(),
            ErrorCode::InvalidCandidate,
        );
    }

    #[test]
    fn test_tally_matches_voters_over_vote_sequence() {
        let mut ballot = reference_ballot();
        let voters: Vec<Pubkey> = (0..12).map(|_| Pubkey::new_unique()).collect();
        let mut records: HashMap<Pubkey, VoterRecord> = HashMap::new();

        // Every voter tries three times with a mix of valid and invalid ids.
        for round in 0..3u64 {
            for (i, voter) in voters.iter().enumerate() {
                let candidate_id = (i as u64 * 7 + round * 3) % 5;
                let record = records.entry(*voter).or_default();
                let was_voted = record.has_voted;
                let before = tallies(&ballot);

                match ballot.record_vote(record, *voter, candidate_id, round) {
                    Ok(_) => {
                        let after = tallies(&ballot);
                        for (id, (b, a)) in before.iter().zip(after.iter()).enumerate() {
                            let expected = if id as u64 == candidate_id { b + 1 } else { *b };
                            assert_eq!(*a, expected);
                        }
                    }
                    Err(_) => assert_eq!(tallies(&ballot), before),
                }
                // One-way flag.
                assert!(!was_voted || record.has_voted);

                let voted = records.values().filter(|r| r.has_voted).count() as u64;
                let total: u64 = tallies(&ballot).iter().sum();
                assert_eq!(total, voted);
            }
        }
    }
}
