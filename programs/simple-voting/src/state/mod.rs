pub mod ballot;
pub mod voter_record;

pub use ballot::*;
pub use voter_record::*;
