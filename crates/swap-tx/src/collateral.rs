//! Collateral creation transaction builder
//!
//! Creates exactly one pure-coin output of the requested size at the wallet
//! address. Inputs are left to the signer's coin selection over that same
//! address, and change returns there too.

use swap_core::{Address, Lovelace};

use crate::plan::UnsignedTx;
use crate::selection::total_coin;
use crate::utxo::{TxOutput, Utxo};
use crate::value::Value;

// =============================================================================
// Error type
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollateralBuildError {
    #[error("Collateral amount must be greater than zero")]
    ZeroAmount,

    #[error("Insufficient ADA for collateral: have {have} lovelace, need {need} lovelace")]
    InsufficientCoin { have: Lovelace, need: Lovelace },
}

// =============================================================================
// Build
// =============================================================================

#[derive(Debug, Clone)]
pub struct CollateralSummary {
    pub address: Address,
    pub amount: Lovelace,
    pub wallet_coin: Lovelace,
}

#[derive(Debug, Clone)]
pub struct CollateralBuildResult {
    pub unsigned_tx: UnsignedTx,
    pub summary: CollateralSummary,
}

/// Build the standalone transaction that creates a collateral UTxO.
///
/// `wallet_utxos` is only used to check the wallet can afford the output; the
/// plan itself names the address, not specific inputs.
pub fn build_collateral_tx(
    wallet_utxos: &[Utxo],
    address: &Address,
    amount: Lovelace,
    ttl_offset: u64,
) -> Result<CollateralBuildResult, CollateralBuildError> {
    if amount == 0 {
        return Err(CollateralBuildError::ZeroAmount);
    }

    let wallet_coin = total_coin(wallet_utxos);
    if wallet_coin < amount {
        return Err(CollateralBuildError::InsufficientCoin {
            have: wallet_coin,
            need: amount,
        });
    }

    let mut unsigned_tx = UnsignedTx::new(address.clone(), ttl_offset);
    unsigned_tx.add_input_address(address.clone());
    unsigned_tx.add_output(TxOutput::new(address.clone(), Value::lovelace(amount)));

    Ok(CollateralBuildResult {
        unsigned_tx,
        summary: CollateralSummary {
            address: address.clone(),
            amount,
            wallet_coin,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utxo::OutputRef;

    fn wallet() -> Address {
        Address::new("addr_test1vr2jvlvw62kv82x8gn0pewn6n5r82m6zxxn6c7vp04t9avs3wgpxv")
    }

    fn funds(coin: u64) -> Vec<Utxo> {
        vec![Utxo::new(
            OutputRef::new("f0", 0),
            TxOutput::new(wallet(), Value::lovelace(coin)),
        )]
    }

    #[test]
    fn test_build_collateral_tx() {
        let result = build_collateral_tx(&funds(100_000_000), &wallet(), 5_000_000, 120).unwrap();
        let tx = &result.unsigned_tx;

        assert!(tx.script_inputs.is_empty());
        assert!(tx.inputs.is_empty());
        assert_eq!(tx.input_addresses, vec![wallet()]);
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].address, wallet());
        assert_eq!(tx.outputs[0].value, Value::lovelace(5_000_000));
        assert_eq!(tx.change_address, wallet());
        assert_eq!(tx.ttl_offset, 120);
        assert!(!tx.requires_collateral());

        assert_eq!(result.summary.wallet_coin, 100_000_000);
    }

    #[test]
    fn test_build_collateral_tx_insufficient() {
        match build_collateral_tx(&funds(1_000_000), &wallet(), 5_000_000, 120) {
            Err(CollateralBuildError::InsufficientCoin { have, need }) => {
                assert_eq!(have, 1_000_000);
                assert_eq!(need, 5_000_000);
            }
            _ => panic!("Wrong error type"),
        }
        assert_eq!(
            build_collateral_tx(&funds(1), &wallet(), 0, 120).unwrap_err(),
            CollateralBuildError::ZeroAmount
        );
    }
}
