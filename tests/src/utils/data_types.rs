use std::sync::Arc;

use anchor_client::{
    solana_sdk::{pubkey::Pubkey, signature::Keypair},
    Cluster,
};
use voting_cli::RpcLedger;

pub struct ProgramTestContext {
    pub cluster: Cluster,
    pub payer: Arc<Keypair>,
    pub ballot_pda: Pubkey,
    pub voters: Vec<Arc<Keypair>>,
}

/// A voter together with a ledger client that signs as that voter.
pub struct TestVoter {
    pub keypair: Arc<Keypair>,
    pub ledger: RpcLedger,
}
