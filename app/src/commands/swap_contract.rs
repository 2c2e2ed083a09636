//! `swap-contract` subcommand

use clap::{ArgGroup, Args};
use oracle_swap::SwapContract;

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .args(["liquidity", "address", "add_liquidity", "start_swap"])
))]
pub struct SwapContractArgs {
    /// Pool balances
    #[arg(long)]
    pub liquidity: bool,

    /// Swap contract address
    #[arg(long)]
    pub address: bool,

    /// Deposit A quote units and B whole native coins into the pool
    #[arg(long, num_args = 2, value_names = ["A", "B"])]
    pub add_liquidity: Option<Vec<u64>>,

    /// Mint the pool NFT and open the pool
    #[arg(long)]
    pub start_swap: bool,
}

pub async fn run(contract: &SwapContract, args: SwapContractArgs) -> anyhow::Result<()> {
    if args.address {
        println!("{}", contract.swap_address());
        return Ok(());
    }

    if args.start_swap {
        let outcome = contract.start_swap().await?;
        return super::report_submission("start-swap", &outcome);
    }

    if let Some(amounts) = args.add_liquidity {
        let &[quote, native] = amounts.as_slice() else {
            anyhow::bail!("--add-liquidity takes exactly two amounts");
        };
        let outcome = contract.add_liquidity(quote, native).await?;
        super::report_submission("add-liquidity", &outcome)?;
    }

    let pool = contract.pool_liquidity().await?;
    println!("Swap contract liquidity:");
    println!("- {} lovelace", pool.native_coin_balance);
    println!("- {} quote units", pool.asset_a_balance);
    Ok(())
}
