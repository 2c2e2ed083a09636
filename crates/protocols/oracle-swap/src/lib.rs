//! Oracle Swap Protocol Implementation
//!
//! A single-pool swap between the native coin and one quote asset, priced by
//! an on-chain oracle feed instead of a bonding curve.
//!
//! # Protocol Overview
//!
//! - The pool UTxO sits at the swap script address, identified by its NFT
//! - The oracle feed UTxO, identified by its own NFT, publishes the price as
//!   an inline datum and is read as a reference input
//! - SwapA sells quote units for native coin, SwapB sells native coin for
//!   quote units, both at the oracle price with floor rounding
//! - An ODV request prepays the oracle's nodes in their payment token, sized
//!   from the fee schedule in the oracle's aggregation-state datum
//!
//! # Example
//!
//! ```ignore
//! use oracle_swap::{SwapContract, TradeDirection};
//!
//! let contract = SwapContract::new(&config, provider, signer, sleeper);
//! let plan = contract.preview_trade(TradeDirection::SwapB, 5).await?;
//! println!("5 ADA buys {} quote units", plan.amount_out);
//! ```

pub mod balance;
pub mod calculator;
pub mod collateral;
pub mod contract;
pub mod datum;
pub mod odv;
pub mod oracle;
pub mod pool;
pub mod state;
pub mod tx_builder;

pub use calculator::{display_price, native_to_quote, quote_to_native};
pub use collateral::ensure_collateral;
pub use contract::{
    check_user_funds, plan_trade, OdvRequestOutcome, OracleFeed, SwapContract, TradeOutcome,
    UserLiquidity,
};
pub use datum::OraclePriceDatum;
pub use odv::{get_aggstate_settings, AggStateSettings};
pub use oracle::{get_oracle_quote, OracleQuote};
pub use pool::get_pool_utxo;
pub use state::*;
pub use tx_builder::{
    build_add_liquidity_tx, build_odv_request_tx, build_start_swap_tx, build_swap_tx,
    SwapTxContext,
};
