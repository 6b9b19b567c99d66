use anchor_lang::prelude::*;

use crate::{Ballot, Deployed};

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(
        init,
        seeds = [b"Ballot".as_ref()],
        bump,
        payer = payer,
        space = 8 + Ballot::INIT_SPACE
    )]
    pub ballot: Box<Account<'info, Ballot>>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Initialize>, candidate_names: Vec<String>) -> Result<()> {
    let clock = Clock::get()?;
    let authority = ctx.accounts.payer.key();
    let ballot = &mut ctx.accounts.ballot;

    let candidate_count =
        ballot.initialize(authority, candidate_names, ctx.bumps.ballot, clock.slot)?;

    emit!(Deployed { candidate_count });

    Ok(())
}
