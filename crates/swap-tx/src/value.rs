//! Multi-asset values
//!
//! A value is the native coin plus a bundle of `policy -> name -> quantity`.
//! Zero quantities are never stored, so two equal bundles always compare equal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use swap_core::{AssetClass, Lovelace, PolicyId};
use thiserror::Error;

/// Errors from value arithmetic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("Quantity overflow for {asset}")]
    Overflow { asset: String },

    #[error("Insufficient {asset}: need {required}, have {available}")]
    Underflow {
        asset: String,
        required: u64,
        available: u64,
    },
}

const LOVELACE: &str = "lovelace";

/// Token bundle keyed by policy, then hex asset name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiAsset(BTreeMap<PolicyId, BTreeMap<String, u64>>);

impl MultiAsset {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bundle holding a single asset
    pub fn from_asset(asset: &AssetClass, quantity: u64) -> Self {
        let mut bundle = Self::new();
        bundle.set(asset, quantity);
        bundle
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Quantity held of `asset` (0 when absent)
    pub fn get(&self, asset: &AssetClass) -> u64 {
        self.0
            .get(&asset.policy_id)
            .and_then(|names| names.get(&asset.asset_name))
            .copied()
            .unwrap_or(0)
    }

    /// Overwrite the quantity of `asset`; zero removes the entry.
    pub fn set(&mut self, asset: &AssetClass, quantity: u64) {
        if quantity == 0 {
            if let Some(names) = self.0.get_mut(&asset.policy_id) {
                names.remove(&asset.asset_name);
                if names.is_empty() {
                    self.0.remove(&asset.policy_id);
                }
            }
            return;
        }
        self.0
            .entry(asset.policy_id.clone())
            .or_default()
            .insert(asset.asset_name.clone(), quantity);
    }

    /// Add `quantity` of `asset`, failing on overflow.
    pub fn add_asset(&mut self, asset: &AssetClass, quantity: u64) -> Result<(), ValueError> {
        let total = self
            .get(asset)
            .checked_add(quantity)
            .ok_or_else(|| ValueError::Overflow {
                asset: asset.to_string(),
            })?;
        self.set(asset, total);
        Ok(())
    }

    /// Remove `quantity` of `asset`, failing if not enough is held.
    pub fn sub_asset(&mut self, asset: &AssetClass, quantity: u64) -> Result<(), ValueError> {
        let available = self.get(asset);
        let remaining = available
            .checked_sub(quantity)
            .ok_or_else(|| ValueError::Underflow {
                asset: asset.to_string(),
                required: quantity,
                available,
            })?;
        self.set(asset, remaining);
        Ok(())
    }

    /// Iterate `(asset, quantity)` pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (AssetClass, u64)> + '_ {
        self.0.iter().flat_map(|(policy, names)| {
            names.iter().map(move |(name, quantity)| {
                (
                    AssetClass {
                        policy_id: policy.clone(),
                        asset_name: name.clone(),
                    },
                    *quantity,
                )
            })
        })
    }

    /// Number of distinct assets in the bundle
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    /// Bundle inclusion: holds at least every quantity in `other`.
    pub fn contains(&self, other: &MultiAsset) -> bool {
        other
            .iter()
            .all(|(asset, quantity)| self.get(&asset) >= quantity)
    }

    pub fn checked_add(&self, other: &MultiAsset) -> Result<Self, ValueError> {
        let mut sum = self.clone();
        for (asset, quantity) in other.iter() {
            sum.add_asset(&asset, quantity)?;
        }
        Ok(sum)
    }

    pub fn checked_sub(&self, other: &MultiAsset) -> Result<Self, ValueError> {
        let mut diff = self.clone();
        for (asset, quantity) in other.iter() {
            diff.sub_asset(&asset, quantity)?;
        }
        Ok(diff)
    }
}

/// Native coin plus token bundle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    pub coin: Lovelace,
    #[serde(default, skip_serializing_if = "MultiAsset::is_empty")]
    pub multi_asset: MultiAsset,
}

impl Value {
    /// A coin-only value
    pub fn lovelace(coin: Lovelace) -> Self {
        Self {
            coin,
            multi_asset: MultiAsset::new(),
        }
    }

    /// Builder-style: add an asset to this value
    pub fn with_asset(mut self, asset: &AssetClass, quantity: u64) -> Result<Self, ValueError> {
        self.multi_asset.add_asset(asset, quantity)?;
        Ok(self)
    }

    /// True when the value carries nothing but the native coin
    pub fn is_pure_coin(&self) -> bool {
        self.multi_asset.is_empty()
    }

    pub fn contains(&self, other: &Value) -> bool {
        self.coin >= other.coin && self.multi_asset.contains(&other.multi_asset)
    }

    pub fn checked_add(&self, other: &Value) -> Result<Self, ValueError> {
        let coin = self
            .coin
            .checked_add(other.coin)
            .ok_or_else(|| ValueError::Overflow {
                asset: LOVELACE.to_string(),
            })?;
        Ok(Self {
            coin,
            multi_asset: self.multi_asset.checked_add(&other.multi_asset)?,
        })
    }

    pub fn checked_sub(&self, other: &Value) -> Result<Self, ValueError> {
        let coin = self
            .coin
            .checked_sub(other.coin)
            .ok_or_else(|| ValueError::Underflow {
                asset: LOVELACE.to_string(),
                required: other.coin,
                available: self.coin,
            })?;
        Ok(Self {
            coin,
            multi_asset: self.multi_asset.checked_sub(&other.multi_asset)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_zero_quantities_elided() {
        let mut bundle = MultiAsset::from_asset(&usdt(), 5);
        assert_eq!(bundle.len(), 1);
        bundle.sub_asset(&usdt(), 5).unwrap();
        assert!(bundle.is_empty());
        assert_eq!(bundle, MultiAsset::new());

        assert!(MultiAsset::from_asset(&usdt(), 0).is_empty());
    }

    #[test]
    fn test_contains_is_inclusion_not_equality() {
        let pool = Value::lovelace(50_000_000)
            .with_asset(&nft(), 1)
            .unwrap()
            .with_asset(&usdt(), 100)
            .unwrap();

        let just_nft = MultiAsset::from_asset(&nft(), 1);
        assert!(pool.multi_asset.contains(&just_nft));
        assert!(!just_nft.contains(&pool.multi_asset));
        assert!(!pool
            .multi_asset
            .contains(&MultiAsset::from_asset(&usdt(), 101)));
        assert!(pool.multi_asset.contains(&MultiAsset::new()));
    }

    #[test]
    fn test_checked_sub_reports_shortfall() {
        let have = Value::lovelace(10).with_asset(&usdt(), 3).unwrap();
        let want = Value::lovelace(5).with_asset(&usdt(), 4).unwrap();

        match have.checked_sub(&want) {
            Err(ValueError::Underflow {
                required,
                available,
                ..
            }) => {
                assert_eq!(required, 4);
                assert_eq!(available, 3);
            }
            other => panic!("Wrong result: {:?}", other),
        }

        let diff = want.checked_sub(&Value::lovelace(5)).unwrap();
        assert_eq!(diff.coin, 0);
        assert_eq!(diff.multi_asset.get(&usdt()), 4);
    }

    #[test]
    fn test_checked_add_overflow() {
        let big = Value::lovelace(u64::MAX);
        assert!(matches!(
            big.checked_add(&Value::lovelace(1)),
            Err(ValueError::Overflow { .. })
        ));
    }

    #[test]
    fn test_value_json_shape() {
        let value = Value::lovelace(2_000_000).with_asset(&usdt(), 7).unwrap();
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["coin"], 2_000_000);
        assert_eq!(
            json["multiAsset"]["c6f192a236596e2bbaac5900d67e9700dec7c77d9da626c98e0ab2ac"]
                ["7455534454"],
            7
        );

        let pure = serde_json::to_value(Value::lovelace(1)).unwrap();
        assert!(pure.get("multiAsset").is_none());
    }
}
