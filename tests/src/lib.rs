pub mod utils;

#[cfg(test)]
mod test_voting_flow;
