use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCode {
    #[msg("You have already voted!")]
    AlreadyVoted,
    #[msg("Invalid candidate ID!")]
    InvalidCandidate,
    #[msg("Ballot needs at least one candidate")]
    NoCandidates,
    #[msg("Too many candidates")]
    TooManyCandidates,
    #[msg("Candidate name too long")]
    CandidateNameTooLong,
    #[msg("Vote tally overflow")]
    TallyOverflow,
}
