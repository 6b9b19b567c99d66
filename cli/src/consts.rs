/// Genesis hash of mainnet-beta. Clients expect to be attached to this cluster.
pub const TARGET_NETWORK: &str = "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d";

/// Endpoint registered with the wallet when it does not know the target network.
pub const TARGET_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

pub const DEFAULT_CANDIDATES: [&str; 3] = ["Candidate A", "Candidate B", "Candidate C"];

/// Tallies shown while the ballot cannot be read.
pub const DEMO_CANDIDATES: [(&str, u64); 3] =
    [("Candidate A", 15), ("Candidate B", 23), ("Candidate C", 8)];

pub const DEMO_MODE_ERROR: &str = "Using demo data - Contract not deployed yet";

pub const UNREACHABLE_DEMO_ERROR: &str = "Using demo data - Ledger unreachable";

pub use simple_voting::{MAX_CANDIDATES, MAX_CANDIDATE_NAME_LEN};
