//! swap-tx: Transaction building utilities for the oracle swap engine
//!
//! Provides ledger value types, UTxO selection, Plutus data helpers and the
//! unsigned transaction plan handed to the external signer.

pub mod collateral;
pub mod plan;
pub mod plutus;
pub mod selection;
pub mod utxo;
pub mod value;

pub use collateral::{
    build_collateral_tx, CollateralBuildError, CollateralBuildResult, CollateralSummary,
};
pub use plan::*;
pub use plutus::PlutusError;
pub use selection::{
    select_collateral, select_unique, total_asset, total_coin, utxos_containing, SelectionError,
};
pub use utxo::*;
pub use value::*;
