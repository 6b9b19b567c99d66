use std::sync::Arc;

use anchor_client::{
    anchor_lang::system_program,
    solana_sdk::{
        compute_budget::ComputeBudgetInstruction,
        instruction::Instruction,
        pubkey::Pubkey,
        signature::{Keypair, Signature},
        signer::Signer,
        transaction::Transaction,
    },
    ClientError, Program,
};
use simple_voting::{accounts, instruction, Ballot, VoterRecord};

pub struct TxSender<'a> {
    pub program: &'a Program<Arc<Keypair>>,
    pub micro_lamports: Option<u64>,
    pub payer: &'a Keypair,
}

impl<'a> TxSender<'a> {
    pub async fn send(&self, ixs: Vec<Instruction>) -> Result<Signature, ClientError> {
        send_with_anchor(ixs, self.micro_lamports, &[self.payer], self.program).await
    }
}

/// Sends an Anchor request manually, ensuring proper setup and signing.
async fn send_with_anchor(
    mut ixs: Vec<Instruction>,
    micro_lamports: Option<u64>,
    signers: &[&Keypair],
    program: &Program<Arc<Keypair>>,
) -> Result<Signature, ClientError> {
    let payer = program.payer();
    let rpc = program.rpc();
    let blockhash = rpc.get_latest_blockhash().await?;

    if let Some(lamports) = micro_lamports {
        ixs.insert(
            0,
            ComputeBudgetInstruction::set_compute_unit_price(lamports),
        );
    }

    let tx = Transaction::new_signed_with_payer(&ixs, Some(&payer), signers, blockhash);
    rpc.send_and_confirm_transaction(&tx)
        .await
        .map_err(ClientError::SolanaClientError)
}

pub async fn send_initialize(
    tx_sender: &TxSender<'_>,
    candidate_names: Vec<String>,
) -> Result<Signature, ClientError> {
    let ixs = tx_sender
        .program
        .request()
        .accounts(accounts::Initialize {
            payer: tx_sender.payer.pubkey(),
            ballot: Ballot::pda().0,
            system_program: system_program::ID,
        })
        .args(instruction::Initialize { candidate_names })
        .instructions()?;

    tx_sender.send(ixs).await
}

pub async fn send_cast_vote(
    tx_sender: &TxSender<'_>,
    voter: Pubkey,
    candidate_id: u64,
) -> Result<Signature, ClientError> {
    let ixs = tx_sender
        .program
        .request()
        .accounts(accounts::CastVote {
            voter,
            ballot: Ballot::pda().0,
            voter_record: VoterRecord::pda(&voter).0,
            system_program: system_program::ID,
        })
        .args(instruction::CastVote { candidate_id })
        .instructions()?;

    tx_sender.send(ixs).await
}
