use anchor_lang::prelude::*;

use crate::{Ballot, VoteCast, VoterRecord};

#[derive(Accounts)]
pub struct CastVote<'info> {
    #[account(mut)]
    pub voter: Signer<'info>,
    #[account(
        mut,
        seeds = [b"Ballot".as_ref()],
        bump = ballot.bump
    )]
    pub ballot: Box<Account<'info, Ballot>>,
    // Created on the first vote so a repeat vote reaches the handler and fails
    // with AlreadyVoted instead of an account-in-use error.
    #[account(
        init_if_needed,
        seeds = [b"VoterRecord".as_ref(), voter.key().as_ref()],
        bump,
        payer = voter,
        space = 8 + VoterRecord::INIT_SPACE
    )]
    pub voter_record: Box<Account<'info, VoterRecord>>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<CastVote>, candidate_id: u64) -> Result<()> {
    let voter = ctx.accounts.voter.key();
    let ballot = &mut ctx.accounts.ballot;
    let voter_record = &mut ctx.accounts.voter_record;

    let clock = Clock::get()?;
    let candidate_name = ballot.record_vote(voter_record, voter, candidate_id, clock.slot)?;
    voter_record.bump = ctx.bumps.voter_record;

    emit!(VoteCast {
        voter,
        candidate_id,
        candidate_name,
    });

    Ok(())
}
