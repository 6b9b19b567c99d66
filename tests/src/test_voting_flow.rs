use std::{sync::Arc, time::Duration};

use anchor_client::{
    solana_sdk::{
        commitment_config::CommitmentConfig,
        signature::{read_keypair_file, Keypair},
        signer::Signer,
    },
    Client, Cluster, Program,
};
use simple_voting::{error::ErrorCode, Ballot};
use voting_cli::{LedgerClient, RpcLedger, VoteError};

use crate::utils::{
    assert::{assert_ledger_err, assert_vote_err, custom_error},
    data_types::ProgramTestContext,
    fetch_utils::*,
};

const CANDIDATES: [&str; 3] = ["Candidate A", "Candidate B", "Candidate C"];

async fn test_initialize(program: &Program<Arc<Keypair>>, context: &ProgramTestContext) {
    let admin = RpcLedger::new(
        context.cluster.clone(),
        context.payer.clone(),
        CommitmentConfig::confirmed(),
        None,
    )
    .unwrap();

    // Not deployed yet.
    assert_ledger_err(admin.candidate_count().await, "not deployed");

    // Invalid candidate lists are rejected.
    assert_ledger_err(
        admin.initialize(vec![]).await,
        &custom_error(ErrorCode::NoCandidates),
    );
    assert_ledger_err(
        admin.initialize(vec!["x".repeat(33)]).await,
        &custom_error(ErrorCode::CandidateNameTooLong),
    );

    admin
        .initialize(CANDIDATES.iter().map(|s| s.to_string()).collect())
        .await
        .unwrap();

    let ballot = fetch_ballot(program).await;
    assert_eq!(ballot.authority, context.payer.pubkey());
    assert_eq!(ballot.candidate_count(), 3);
    for (idx, candidate) in ballot.all_candidates().iter().enumerate() {
        assert_eq!(candidate.id, idx as u64);
        assert_eq!(candidate.name, CANDIDATES[idx]);
        assert_eq!(candidate.vote_count, 0);
    }
    assert_eq!(Ballot::pda().0, context.ballot_pda);

    // The ballot can only be created once.
    assert!(admin
        .initialize(vec!["Another".to_string()])
        .await
        .is_err());
}

async fn test_voting(program: &Program<Arc<Keypair>>, context: &ProgramTestContext) {
    let x = funded_voter(context, context.voters[0].clone()).await;
    let y = funded_voter(context, context.voters[1].clone()).await;
    let z = funded_voter(context, context.voters[2].clone()).await;

    assert!(!x.ledger.has_voted(&x.keypair.pubkey()).await.unwrap());
    assert!(fetch_voter_record(program, &x.keypair.pubkey())
        .await
        .is_err());

    // Live VoteCast events reach a subscriber.
    let mut subscription = z.ledger.subscribe().await.unwrap();

    x.ledger.cast_vote(&x.keypair.pubkey(), 0).await.unwrap();
    assert_eq!(x.ledger.vote_count(0).await.unwrap(), 1);
    assert!(x.ledger.has_voted(&x.keypair.pubkey()).await.unwrap());

    let record = fetch_voter_record(program, &x.keypair.pubkey())
        .await
        .unwrap();
    assert!(record.has_voted);
    assert_eq!(record.candidate_id, 0);
    assert_eq!(record.voter, x.keypair.pubkey());

    let event = tokio::time::timeout(Duration::from_secs(30), subscription.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.voter, x.keypair.pubkey());
    assert_eq!(event.candidate_id, 0);
    assert_eq!(event.candidate_name, "Candidate A");
    drop(subscription);

    y.ledger.cast_vote(&y.keypair.pubkey(), 0).await.unwrap();
    assert_eq!(y.ledger.vote_count(0).await.unwrap(), 2);

    // Double vote
    assert_vote_err(
        x.ledger.cast_vote(&x.keypair.pubkey(), 1).await,
        VoteError::AlreadyVoted,
    );
    assert_eq!(x.ledger.vote_count(1).await.unwrap(), 0);

    // Out of range candidate
    assert_vote_err(
        z.ledger.cast_vote(&z.keypair.pubkey(), 3).await,
        VoteError::InvalidCandidate,
    );
    assert!(!z.ledger.has_voted(&z.keypair.pubkey()).await.unwrap());

    // A client cannot vote on behalf of another identity.
    assert_ledger_err(
        z.ledger.cast_vote(&x.keypair.pubkey(), 2).await,
        "cannot vote as",
    );

    z.ledger.cast_vote(&z.keypair.pubkey(), 2).await.unwrap();

    let ballot = fetch_ballot(program).await;
    let counts: Vec<u64> = ballot
        .all_candidates()
        .iter()
        .map(|c| c.vote_count)
        .collect();
    assert_eq!(counts, vec![2, 0, 1]);
    assert_ledger_err(z.ledger.candidate(3).await, "Invalid candidate ID");
}

#[tokio::test]
#[ignore = "requires a local validator with the program deployed (anchor test)"]
async fn main() {
    let anchor_wallet = std::env::var("ANCHOR_WALLET").unwrap();
    let payer = Arc::new(read_keypair_file(&anchor_wallet).unwrap());

    let client = Client::new_with_options(
        Cluster::Localnet,
        payer.clone(),
        CommitmentConfig::confirmed(),
    );
    let program: Program<Arc<Keypair>> = client.program(simple_voting::id()).unwrap();

    let context = ProgramTestContext {
        cluster: Cluster::Localnet,
        payer,
        ballot_pda: Ballot::pda().0,
        voters: (0..3).map(|_| Arc::new(Keypair::new())).collect(),
    };
    test_initialize(&program, &context).await;
    test_voting(&program, &context).await;
}
