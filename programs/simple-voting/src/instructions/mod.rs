pub mod cast_vote;
pub mod initialize;

pub use cast_vote::*;
pub use initialize::*;
