#![allow(ambiguous_glob_reexports)]
#![allow(unexpected_cfgs)] // See: https://solana.stackexchange.com/a/19845

pub mod error;
pub mod events;
pub mod instructions;
pub mod state;

use anchor_lang::prelude::*;

pub use events::*;
pub use instructions::*;
pub use state::*;

declare_id!("8EAQTRYcC4yPYQo8RWYjmMuzevevMgndRBZA58ma6XYP");

#[program]
pub mod simple_voting {
    use super::*;

    pub fn initialize(ctx: Context<Initialize>, candidate_names: Vec<String>) -> Result<()> {
        initialize::handler(ctx, candidate_names)
    }

    pub fn cast_vote(ctx: Context<CastVote>, candidate_id: u64) -> Result<()> {
        cast_vote::handler(ctx, candidate_id)
    }
}
