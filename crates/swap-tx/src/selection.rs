//! UTxO selection utilities
//!
//! Locating the single UTxO that carries an identifying NFT, picking a
//! collateral candidate, and summing balances over a UTxO set.

use std::fmt;

use swap_core::{AssetClass, Lovelace};

use crate::utxo::Utxo;
use crate::value::MultiAsset;

// =============================================================================
// Error type
// =============================================================================

/// Error returned when a unique UTxO cannot be singled out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// No UTxO holds the asset
    NotFound { asset: String },
    /// More than one UTxO holds the asset
    Ambiguous { asset: String, matches: usize },
}

impl SelectionError {
    /// Number of matching UTxOs that caused the failure
    pub fn matches(&self) -> usize {
        match self {
            SelectionError::NotFound { .. } => 0,
            SelectionError::Ambiguous { matches, .. } => *matches,
        }
    }
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::NotFound { asset } => write!(f, "No UTxO holds {}", asset),
            SelectionError::Ambiguous { asset, matches } => {
                write!(f, "{} UTxOs hold {}, expected exactly one", matches, asset)
            }
        }
    }
}

impl std::error::Error for SelectionError {}

// =============================================================================
// Selection functions
// =============================================================================

/// All UTxOs whose token bundle includes `bundle`.
pub fn utxos_containing<'a>(utxos: &'a [Utxo], bundle: &MultiAsset) -> Vec<&'a Utxo> {
    utxos.iter().filter(|u| u.contains(bundle)).collect()
}

/// The single UTxO holding at least one unit of `asset`.
///
/// Uses bundle inclusion, so change assets co-located in the same UTxO do not
/// disturb the match.
pub fn select_unique<'a>(utxos: &'a [Utxo], asset: &AssetClass) -> Result<&'a Utxo, SelectionError> {
    let bundle = MultiAsset::from_asset(asset, 1);
    let mut matching = utxos_containing(utxos, &bundle);
    match matching.len() {
        0 => Err(SelectionError::NotFound {
            asset: asset.to_string(),
        }),
        1 => Ok(matching.remove(0)),
        n => Err(SelectionError::Ambiguous {
            asset: asset.to_string(),
            matches: n,
        }),
    }
}

/// Pick a collateral candidate: pure-coin, within `required ± tolerance`.
///
/// The candidate closest to `required` wins; ties go to the lowest output
/// reference so the choice is deterministic.
pub fn select_collateral(utxos: &[Utxo], required: Lovelace, tolerance: Lovelace) -> Option<&Utxo> {
    let low = required.saturating_sub(tolerance);
    let high = required.saturating_add(tolerance);

    utxos
        .iter()
        .filter(|u| u.value().is_pure_coin() && u.output.datum.is_none())
        .filter(|u| (low..=high).contains(&u.coin()))
        .min_by(|a, b| {
            a.coin()
                .abs_diff(required)
                .cmp(&b.coin().abs_diff(required))
                .then_with(|| a.input.cmp(&b.input))
        })
}

/// Total native coin over a UTxO set
pub fn total_coin(utxos: &[Utxo]) -> Lovelace {
    utxos.iter().fold(0u64, |acc, u| acc.saturating_add(u.coin()))
}

/// Total quantity of `asset` over a UTxO set
pub fn total_asset(utxos: &[Utxo], asset: &AssetClass) -> u64 {
    utxos
        .iter()
        .fold(0u64, |acc, u| acc.saturating_add(u.quantity_of(asset)))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utxo::{Datum, OutputRef, TxOutput};
    use crate::value::Value;
    use swap_core::Address;

    fn nft() -> AssetClass {
        AssetClass::from_utf8_name(
            "ce8822885d18e7d304ef0248af49359d687a94f0e3635eea14c6154e",
            "SWAP3",
        )
    }

    fn usdt() -> AssetClass {
        AssetClass::from_utf8_name(
            "c6f192a236596e2bbaac5900d67e9700dec7c77d9da626c98e0ab2ac",
            "tUSDT",
        )
    }

    fn mock_utxo(tx: &str, coin: u64, assets: &[(AssetClass, u64)]) -> Utxo {
        let mut value = Value::lovelace(coin);
        for (asset, qty) in assets {
            value = value.with_asset(asset, *qty).unwrap();
        }
        Utxo::new(
            OutputRef::new(tx, 0),
            TxOutput::new(Address::new("addr_test1wswap"), value),
        )
    }

    #[test]
    fn test_select_unique_tolerates_extra_assets() {
        let utxos = vec![
            mock_utxo("a", 5_000_000, &[(usdt(), 10)]),
            mock_utxo("b", 50_000_000, &[(nft(), 1), (usdt(), 100)]),
        ];
        let found = select_unique(&utxos, &nft()).unwrap();
        assert_eq!(found.input.tx_id.as_str(), "b");
    }

    #[test]
    fn test_select_unique_empty() {
        match select_unique(&[], &nft()) {
            Err(e @ SelectionError::NotFound { .. }) => assert_eq!(e.matches(), 0),
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_select_unique_ambiguous() {
        let utxos = vec![
            mock_utxo("a", 2_000_000, &[(nft(), 1)]),
            mock_utxo("b", 2_000_000, &[(nft(), 1)]),
        ];
        match select_unique(&utxos, &nft()) {
            Err(SelectionError::Ambiguous { matches, .. }) => assert_eq!(matches, 2),
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_select_collateral_band() {
        let utxos = vec![
            mock_utxo("too_small", 3_900_000, &[]),
            mock_utxo("too_big", 6_100_000, &[]),
            mock_utxo("has_token", 5_000_000, &[(usdt(), 1)]),
            mock_utxo("edge", 4_000_000, &[]),
            mock_utxo("close", 5_200_000, &[]),
        ];
        let picked = select_collateral(&utxos, 5_000_000, 1_000_000).unwrap();
        assert_eq!(picked.input.tx_id.as_str(), "close");

        // Band edges are inclusive
        let picked = select_collateral(&utxos[..4], 5_000_000, 1_000_000).unwrap();
        assert_eq!(picked.input.tx_id.as_str(), "edge");

        assert!(select_collateral(&utxos[..3], 5_000_000, 1_000_000).is_none());
    }

    #[test]
    fn test_select_collateral_skips_datum_outputs() {
        let mut locked = mock_utxo("locked", 5_000_000, &[]);
        locked.output.datum = Some(Datum::Inline("d87980".into()));
        assert!(select_collateral(&[locked], 5_000_000, 0).is_none());
    }

    #[test]
    fn test_totals() {
        let utxos = vec![
            mock_utxo("a", 1_000_000, &[(usdt(), 10)]),
            mock_utxo("b", 2_500_000, &[(usdt(), 5), (nft(), 1)]),
        ];
        assert_eq!(total_coin(&utxos), 3_500_000);
        assert_eq!(total_asset(&utxos, &usdt()), 15);
        assert_eq!(total_asset(&utxos, &nft()), 1);
        assert_eq!(total_coin(&[]), 0);
    }
}
