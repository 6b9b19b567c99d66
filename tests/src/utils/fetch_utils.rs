use std::{sync::Arc, time::Duration};

use anchor_client::{
    solana_sdk::{
        commitment_config::CommitmentConfig, native_token::LAMPORTS_PER_SOL, pubkey::Pubkey,
        signature::Keypair, signer::Signer,
    },
    ClientError, Program,
};
use simple_voting::{Ballot, VoterRecord};
use voting_cli::RpcLedger;

use super::data_types::{ProgramTestContext, TestVoter};

pub async fn fetch_ballot(program: &Program<Arc<Keypair>>) -> Ballot {
    program.account::<Ballot>(Ballot::pda().0).await.unwrap()
}

pub async fn fetch_voter_record(
    program: &Program<Arc<Keypair>>,
    voter: &Pubkey,
) -> Result<VoterRecord, ClientError> {
    program.account::<VoterRecord>(VoterRecord::pda(voter).0).await
}

/// Funds a fresh voter and returns a ledger client that signs as it.
pub async fn funded_voter(context: &ProgramTestContext, keypair: Arc<Keypair>) -> TestVoter {
    let ledger = RpcLedger::new(
        context.cluster.clone(),
        keypair.clone(),
        CommitmentConfig::confirmed(),
        None,
    )
    .unwrap();

    let rpc = ledger.program().rpc();
    let sig = rpc
        .request_airdrop(&keypair.pubkey(), LAMPORTS_PER_SOL)
        .await
        .unwrap();
    while !rpc.confirm_transaction(&sig).await.unwrap() {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    TestVoter { keypair, ledger }
}
