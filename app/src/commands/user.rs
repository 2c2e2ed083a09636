//! `user` subcommand

use clap::{ArgGroup, Args};
use oracle_swap::SwapContract;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("action").required(true).args(["liquidity", "address"])))]
pub struct UserArgs {
    /// Wallet lovelace and quote balances
    #[arg(long)]
    pub liquidity: bool,

    /// Wallet address
    #[arg(long)]
    pub address: bool,
}

pub async fn run(contract: &SwapContract, args: UserArgs) -> anyhow::Result<()> {
    if args.address {
        println!("{}", contract.wallet_address());
        return Ok(());
    }

    let balances = contract.user_liquidity(contract.wallet_address()).await?;
    println!("Wallet liquidity:");
    println!("- {} lovelace", balances.lovelace);
    println!("- {} quote units", balances.quote);
    Ok(())
}
