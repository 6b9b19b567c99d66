use std::{path::PathBuf, sync::Arc, time::Duration};

use anchor_client::{
    solana_sdk::{pubkey::Pubkey, signature::read_keypair_file},
    Cluster,
};
use anyhow::{anyhow, Result};
use clap::Parser;
use log::info;
use rand::Rng;
use tokio::runtime::Builder;
use voting_cli::{
    consts::{DEFAULT_CANDIDATES, TARGET_NETWORK, TARGET_RPC_URL},
    utils::*,
    ClientConfig, InMemoryLedger, KeypairWallet, LedgerClient, MemoryWallet, NetworkId,
    NoticeLevel, RpcLedger, SyncConfig, Synchronizer,
};

#[derive(Clone, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, env, default_value = "id.json")]
    pub keypair_path: PathBuf,

    #[arg(short, long, env, default_value = "http://localhost:8899")]
    pub rpc_url: String,

    #[arg(long, env, help = "Pubsub endpoint, derived from --rpc-url when unset")]
    pub ws_url: Option<String>,

    #[arg(long, env, default_value = TARGET_NETWORK, help = "Genesis hash of the expected cluster")]
    pub target_network: String,

    #[arg(long, env, default_value = TARGET_RPC_URL)]
    pub target_rpc_url: String,

    #[arg(long, env)]
    pub micro_lamports: Option<u64>,

    #[arg(long, env, help = "Ask for confirmation before signing a vote")]
    pub interactive: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            keypair_path: self.keypair_path.clone(),
            rpc_url: self.rpc_url.clone(),
            ws_url: self.ws_url.clone(),
            target_network: NetworkId::new(self.target_network.clone()),
            target_rpc_url: self.target_rpc_url.clone(),
            micro_lamports: self.micro_lamports,
            interactive: self.interactive,
            ..ClientConfig::default()
        }
    }
}

#[derive(clap::Subcommand, Clone)]
pub enum Commands {
    Initialize {
        #[arg(long, value_delimiter = ',', value_parser = parse_candidate_name, help = "Comma separated candidate names")]
        candidates: Option<Vec<String>>,
    },
    Vote {
        #[arg(long, help = "Id of the candidate to vote for")]
        candidate: u64,
    },
    Show {},
    Candidate {
        #[arg(long, help = "Id of the candidate to fetch")]
        id: u64,
    },
    HasVoted {
        #[arg(long, value_parser = parse_pubkey)]
        voter: Pubkey,
    },
    Watch {},
    Simulate {
        #[arg(long, default_value = "10", help = "Number of simulated voters")]
        voters: usize,
    },
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(false)
        .try_init();

    let runtime = Builder::new_multi_thread().enable_all().build()?;
    let cli = Cli::parse();
    runtime.block_on(run(cli))
}

fn load_rpc_ledger(config: &ClientConfig) -> Result<RpcLedger> {
    let payer = read_keypair_file(&config.keypair_path)
        .map_err(|e| anyhow!("failed to read {}: {e}", config.keypair_path.display()))?;
    Ok(RpcLedger::new(
        Cluster::Custom(config.rpc_url.clone(), config.ws_url()),
        Arc::new(payer),
        config.commitment,
        config.micro_lamports,
    )?)
}

async fn connected_synchronizer(config: &ClientConfig) -> Result<Arc<Synchronizer>> {
    let wallet = Arc::new(KeypairWallet::new(config));
    let sync = Synchronizer::new(wallet, SyncConfig::from(config));
    sync.connect().await?;
    Ok(sync)
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.client_config();

    match cli.command {
        Commands::Initialize { candidates } => {
            info!("Initialize...");
            let names = candidates
                .unwrap_or_else(|| DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect());
            let ledger = load_rpc_ledger(&config)?;
            let tx = ledger.initialize(names).await?;
            info!("Transaction sent: {}", tx);

            info!("== Ballot Deployed ==");
            for candidate in ledger.all_candidates().await? {
                info!("Candidate {}: {}", candidate.id, candidate.name);
            }
        }
        Commands::Vote { candidate } => {
            info!("Vote...");
            let sync = connected_synchronizer(&config).await?;
            let tx = sync.vote(candidate).await?;
            info!("Transaction sent: {}", tx);
            println!("{}", render_state(&sync.state()));
        }
        Commands::Show {} => {
            let sync = connected_synchronizer(&config).await?;
            println!("{}", render_state(&sync.state()));
        }
        Commands::Candidate { id } => {
            let ledger = load_rpc_ledger(&config)?;
            let candidate = ledger.candidate(id).await?;
            println!(
                "Candidate {}: {} ({} votes)",
                candidate.id, candidate.name, candidate.vote_count
            );
        }
        Commands::HasVoted { voter } => {
            let ledger = load_rpc_ledger(&config)?;
            println!("{}", ledger.has_voted(&voter).await?);
        }
        Commands::Watch {} => {
            let sync = connected_synchronizer(&config).await?;
            let wallet_task = sync.watch_wallet();
            watch_until_interrupted(&sync).await?;
            wallet_task.abort();
            sync.disconnect();
        }
        Commands::Simulate { voters } => simulate(voters).await?,
    }

    Ok(())
}

async fn watch_until_interrupted(sync: &Synchronizer) -> Result<()> {
    let mut states = sync.watch();
    let mut notices = sync.notices();
    println!("{}", render_state(&states.borrow_and_update()));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                return Ok(());
            }
            changed = states.changed() => {
                changed?;
                let state = states.borrow_and_update().clone();
                if !state.is_loading {
                    println!("{}", render_state(&state));
                }
            }
            notice = notices.recv() => {
                if let Ok(notice) = notice {
                    match notice.level {
                        NoticeLevel::Info => println!("[{}] {}", notice.title, notice.message),
                        NoticeLevel::Error => eprintln!("[{}] {}", notice.title, notice.message),
                    }
                }
            }
        }
    }
}

/// Runs a local ballot with random voters and one observing client.
async fn simulate(voters: usize) -> Result<()> {
    let ledger = Arc::new(InMemoryLedger::with_candidates(DEFAULT_CANDIDATES)?);
    let network = NetworkId::new(TARGET_NETWORK);
    let observer = Pubkey::new_unique();
    let wallet = Arc::new(MemoryWallet::new(ledger.clone(), network.clone()).with_identity(observer));
    let sync = Synchronizer::new(
        wallet,
        SyncConfig {
            target_network: network,
            target_rpc_url: TARGET_RPC_URL.to_string(),
        },
    );
    sync.connect().await?;

    let candidate_count = ledger.candidate_count().await?;
    for _ in 0..voters {
        let voter = Pubkey::new_unique();
        let candidate_id = rand::thread_rng().gen_range(0..candidate_count);
        ledger.cast_vote(&voter, candidate_id).await?;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let choice = rand::thread_rng().gen_range(0..candidate_count);
    sync.vote(choice).await?;
    let state = sync.load_state().await;
    info!(
        "Simulated {} votes, ledger total {}",
        voters + 1,
        ledger.total_votes()
    );
    println!("{}", render_state(&state));
    Ok(())
}
