//! `trade` subcommand

use std::str::FromStr;

use clap::Args;
use oracle_swap::{SwapContract, TradeDirection};

#[derive(Args, Debug)]
pub struct TradeArgs {
    /// Which asset the user sells: `asset-a` (quote units) or `asset-b` (native coin)
    #[arg(value_parser = TradeDirection::from_str, value_name = "SIDE")]
    pub side: TradeDirection,

    /// Quote units (asset-a) or whole native coins (asset-b)
    #[arg(long)]
    pub amount: u64,

    /// Price the trade and print the plan without submitting
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

pub async fn run(contract: &SwapContract, args: TradeArgs) -> anyhow::Result<()> {
    if args.dry_run {
        let plan = contract.preview_trade(args.side, args.amount).await?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let outcome = contract.trade(args.side, args.amount).await?;
    let plan = &outcome.plan;
    match args.side {
        TradeDirection::SwapA => println!(
            "Exchanging {} quote units for {} native coins",
            plan.amount_in, plan.amount_out
        ),
        TradeDirection::SwapB => println!(
            "Exchanging {} native coins for {} quote units",
            plan.amount_in, plan.amount_out
        ),
    }
    println!(
        "Pool after trade: {} lovelace, {} quote units",
        plan.pool_after.native_coin_balance, plan.pool_after.asset_a_balance
    );
    super::report_submission("trade", &outcome.submission)
}
