//! `send-odv-request` subcommand

use clap::Args;
use oracle_swap::SwapContract;

#[derive(Args, Debug)]
pub struct OdvArgs {
    /// Payment-token units to send; defaults to the recommended amount
    #[arg(long)]
    pub funds_to_send: Option<u64>,
}

pub async fn run(contract: &SwapContract, args: OdvArgs) -> anyhow::Result<()> {
    if args.funds_to_send.is_none() {
        let recommended = contract.recommended_odv_funds().await?;
        println!("Minimum quantity required: {}", recommended);
    }

    let outcome = contract.send_odv_request(args.funds_to_send).await?;
    println!(
        "Requesting an oracle update for {} payment-token units (recommended {})",
        outcome.funds, outcome.recommended
    );
    super::report_submission("send-odv-request", &outcome.submission)
}
