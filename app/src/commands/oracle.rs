//! `oracle-contract` subcommand

use clap::{ArgGroup, Args};
use oracle_swap::SwapContract;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("action").required(true).args(["feed", "address"])))]
pub struct OracleArgs {
    /// Current feed price and timestamps
    #[arg(long)]
    pub feed: bool,

    /// Oracle contract address
    #[arg(long)]
    pub address: bool,
}

pub async fn run(contract: &SwapContract, args: OracleArgs) -> anyhow::Result<()> {
    if args.address {
        println!("{}", contract.oracle_address());
        return Ok(());
    }

    let feed = contract.oracle_feed().await?;
    println!("Oracle feed ({}):", feed.quote.source_utxo.input);
    println!("- price: {} native coin per quote unit", feed.display_price);
    println!("- generated at: {} ms", feed.quote.generated_at);
    println!(
        "- expiry: {} ms{}",
        feed.quote.expiry,
        if feed.expired { " (expired)" } else { "" }
    );
    Ok(())
}
