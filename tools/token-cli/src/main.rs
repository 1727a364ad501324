//! token-cli - create, mint and transfer SPL tokens
//!
//! Commands:
//! - `token-cli create` - create a new token with the signer as mint authority
//! - `token-cli mint` - mint supply to yourself or another wallet
//! - `token-cli transfer` - send tokens to another wallet
//! - `token-cli history` - recent token transactions for an address
//! - `token-cli balances` - SOL and token balances for an address

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sol_chain::Pubkey;
use token_core::logging::init_tracing;
use token_core::{
    CreateTokenRequest, JsonRpcClient, KeypairSigner, MintRequest, OperationReceipt, TokenConfig,
    TransactionSigner, TransferRequest,
};
use tracing::debug;

#[derive(Parser)]
#[command(name = "token-cli")]
#[command(about = "Create, mint and transfer SPL tokens")]
struct Cli {
    /// Signer key pair file (solana-keygen JSON). Defaults to ~/.config/solana/id.json
    #[arg(short, long, global = true)]
    keypair: Option<PathBuf>,

    /// devnet, testnet, mainnet-beta or an RPC URL. Overrides the environment
    #[arg(short = 'u', long, global = true)]
    cluster: Option<String>,

    /// JSON config file instead of environment variables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new token
    Create {
        #[arg(short, long, default_value_t = 9)]
        decimals: u8,
        /// Defaults to the signer
        #[arg(long)]
        freeze_authority: Option<String>,
    },
    /// Mint new supply (mint authority only)
    Mint {
        #[arg(short, long)]
        mint: String,
        #[arg(short, long)]
        amount: f64,
        /// Receiving wallet; defaults to the signer
        #[arg(long)]
        to: Option<String>,
    },
    /// Transfer tokens to another wallet
    Transfer {
        #[arg(short, long)]
        mint: String,
        #[arg(long)]
        to: String,
        #[arg(short, long)]
        amount: f64,
    },
    /// Recent token transactions
    History {
        /// Defaults to the signer
        #[arg(long)]
        address: Option<String>,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// SOL and token balances
    Balances {
        /// Defaults to the signer
        #[arg(long)]
        address: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(if cli.verbose { "debug" } else { "warn" });

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => TokenConfig::from_json_file(path)?,
        None => TokenConfig::from_env()?,
    };
    if let Some(cluster) = &cli.cluster {
        config.cluster = cluster.parse()?;
    }
    debug!(cluster = %config.cluster, "using cluster");

    let rpc = JsonRpcClient::from_config(&config).context("failed to build RPC client")?;

    match cli.command {
        Commands::Create {
            decimals,
            freeze_authority,
        } => {
            let signer = load_signer(cli.keypair)?;
            let request = CreateTokenRequest {
                decimals,
                freeze_authority,
            };
            let receipt = token_core::create_token(&rpc, &signer, &request).await?;
            print_receipt("Token created", "mint", &receipt, cli.json)
        }

        Commands::Mint { mint, amount, to } => {
            let signer = load_signer(cli.keypair)?;
            let request = MintRequest {
                mint,
                amount,
                receiver: to,
            };
            let receipt = token_core::mint_tokens(&rpc, &signer, &request).await?;
            print_receipt("Tokens minted", "token account", &receipt, cli.json)
        }

        Commands::Transfer { mint, to, amount } => {
            let signer = load_signer(cli.keypair)?;
            let request = TransferRequest {
                mint,
                recipient: to,
                amount,
            };
            let receipt = token_core::transfer_tokens(&rpc, &signer, &request).await?;
            print_receipt("Tokens transferred", "recipient account", &receipt, cli.json)
        }

        Commands::History { address, limit } => {
            let owner = resolve_address(address, cli.keypair)?;
            if let Some(limit) = limit {
                config.history_limit = limit;
                config.validate()?;
            }
            let records = token_core::recent_transactions(&rpc, &owner, &config).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No token transactions found for {owner}");
            } else {
                for r in &records {
                    println!(
                        "{:>10}  {:<8}  {:<44}  {}",
                        r.timestamp, r.kind, r.mint, r.signature
                    );
                }
            }
            Ok(())
        }

        Commands::Balances { address } => {
            let owner = resolve_address(address, cli.keypair)?;
            let lamports = token_core::sol_balance(&rpc, &owner).await?;
            let tokens = token_core::token_balances(&rpc, &owner).await?;

            if cli.json {
                let out = serde_json::json!({
                    "owner": owner,
                    "lamports": lamports,
                    "tokens": tokens,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{owner}");
                println!("  SOL  {}", token_core::format_sol(lamports));
                for t in &tokens {
                    println!("  {}  {}", t.mint, t.amount);
                }
            }
            Ok(())
        }
    }
}

fn default_keypair_path() -> Result<PathBuf> {
    let home = std::env::var_os("HOME").context("HOME is not set; pass --keypair")?;
    Ok(PathBuf::from(home).join(".config/solana/id.json"))
}

fn load_signer(path: Option<PathBuf>) -> Result<KeypairSigner> {
    let path = match path {
        Some(p) => p,
        None => default_keypair_path()?,
    };
    Ok(KeypairSigner::from_keygen_file(&path)?)
}

/// An explicit address, or the signer's.
fn resolve_address(address: Option<String>, keypair: Option<PathBuf>) -> Result<Pubkey> {
    match address {
        Some(a) => a
            .parse()
            .with_context(|| format!("invalid address {a:?}")),
        None => Ok(load_signer(keypair)?.pubkey()),
    }
}

fn print_receipt(title: &str, label: &str, receipt: &OperationReceipt, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(receipt)?);
    } else {
        println!("{title}");
        println!("  {label}: {}", receipt.address);
        println!("  signature: {}", receipt.signature);
    }
    Ok(())
}
