//! oracle-swap command-line application

pub mod commands;
pub mod signer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ledger_client::TokioSleeper;
use oracle_swap::SwapContract;
use swap_core::AppConfig;

use commands::{
    odv::OdvArgs, oracle::OracleArgs, swap_contract::SwapContractArgs, trade::TradeArgs,
    user::UserArgs,
};
use signer::CommandSigner;

#[derive(Parser, Debug)]
#[command(name = "oracle-swap", version, about = "Trade against an oracle-priced swap pool")]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, global = true, default_value = "oracle-swap.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sell quote units (asset-a) or native coin (asset-b)
    Trade(TradeArgs),
    /// Wallet balances and address
    User(UserArgs),
    /// Pool liquidity, address and administration
    SwapContract(SwapContractArgs),
    /// Oracle feed price and address
    OracleContract(OracleArgs),
    /// Prepay the oracle for an on-demand feed update
    SendOdvRequest(OdvArgs),
}

/// Parse arguments, load configuration and dispatch the subcommand
pub async fn run() -> anyhow::Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    tracing::debug!(network = %config.network, provider = config.provider.name(), "Configuration loaded");

    let contract = build_contract(&config)?;
    match cli.command {
        Command::Trade(args) => commands::trade::run(&contract, args).await,
        Command::User(args) => commands::user::run(&contract, args).await,
        Command::SwapContract(args) => commands::swap_contract::run(&contract, args).await,
        Command::OracleContract(args) => commands::oracle::run(&contract, args).await,
        Command::SendOdvRequest(args) => commands::odv::run(&contract, args).await,
    }
}

fn init_logging() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("oracle_swap=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();
    Ok(())
}

/// Read and validate the configuration file
pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    AppConfig::from_json(&json).with_context(|| format!("Invalid config file {}", path.display()))
}

fn build_contract(config: &AppConfig) -> anyhow::Result<SwapContract> {
    let provider = ledger_client::connect(&config.provider, config.network)
        .context("Failed to set up ledger provider")?;
    let signer = Arc::new(CommandSigner::from_config(&config.signer));
    Ok(SwapContract::new(
        config,
        provider,
        signer,
        Arc::new(TokioSleeper),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_trade() {
        let cli = Cli::try_parse_from([
            "oracle-swap",
            "--config",
            "preprod.json",
            "trade",
            "asset-b",
            "--amount",
            "5",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("preprod.json"));
        match cli.command {
            Command::Trade(args) => {
                assert_eq!(args.amount, 5);
                assert!(args.dry_run);
            }
            other => panic!("Wrong command: {:?}", other),
        }
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["oracle-swap", "oracle-contract", "--feed"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("oracle-swap.json"));
    }

    #[test]
    fn test_parse_send_odv_request() {
        let cli =
            Cli::try_parse_from(["oracle-swap", "send-odv-request", "--funds-to-send", "8000000"])
                .unwrap();
        match cli.command {
            Command::SendOdvRequest(args) => assert_eq!(args.funds_to_send, Some(8_000_000)),
            other => panic!("Wrong command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["oracle-swap", "send-odv-request"]).unwrap();
        match cli.command {
            Command::SendOdvRequest(args) => assert!(args.funds_to_send.is_none()),
            other => panic!("Wrong command: {:?}", other),
        }
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/oracle-swap.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
