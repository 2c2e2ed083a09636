//! Oracle Swap State
//!
//! Pool state, trade direction, redeemers and the priced trade plan.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use swap_core::AssetClass;
use swap_tx::{RedeemerData, Utxo, Value};

/// Balances of the pool UTxO, derived fresh on every read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    /// Lovelace held by the pool
    pub native_coin_balance: u64,
    /// Quote asset units held by the pool
    pub asset_a_balance: u64,
}

impl PoolState {
    pub fn from_value(value: &Value, quote_asset: &AssetClass) -> Self {
        Self {
            native_coin_balance: value.coin,
            asset_a_balance: value.multi_asset.get(quote_asset),
        }
    }
}

/// The pool UTxO together with its decoded state
#[derive(Debug, Clone)]
pub struct PoolUtxo {
    pub utxo: Utxo,
    pub state: PoolState,
}

/// Which side the user sells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeDirection {
    /// User sells quote units for native coin
    SwapA,
    /// User sells whole native coins for quote units
    SwapB,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeDirectionParseError;

impl fmt::Display for TradeDirectionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid trade direction (expected 'asset-a' or 'asset-b')")
    }
}

impl std::error::Error for TradeDirectionParseError {}

impl FromStr for TradeDirection {
    type Err = TradeDirectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asset-a" | "swap_a" => Ok(Self::SwapA),
            "asset-b" | "swap_b" => Ok(Self::SwapB),
            _ => Err(TradeDirectionParseError),
        }
    }
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SwapA => "swap_a",
            Self::SwapB => "swap_b",
        }
    }
}

/// Spend redeemer of the swap validator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapRedeemer {
    SwapA(u64),
    SwapB(u64),
    AddLiquidity,
}

impl SwapRedeemer {
    pub fn for_trade(direction: TradeDirection, amount: u64) -> Self {
        match direction {
            TradeDirection::SwapA => Self::SwapA(amount),
            TradeDirection::SwapB => Self::SwapB(amount),
        }
    }

    pub fn to_data(self) -> RedeemerData {
        match self {
            Self::SwapA(amount) => RedeemerData::new(0, vec![amount]),
            Self::SwapB(amount) => RedeemerData::new(1, vec![amount]),
            Self::AddLiquidity => RedeemerData::unit(2),
        }
    }
}

/// Redeemer of the swap NFT minting policy (`Constr 0 []`)
pub fn mint_token_redeemer() -> RedeemerData {
    RedeemerData::unit(0)
}

/// A fully priced trade, computed before anything touches the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub direction: TradeDirection,
    /// Amount the user sells: quote units (SwapA) or whole coins (SwapB)
    pub amount_in: u64,
    /// Amount the user receives: whole coins (SwapA) or quote units (SwapB)
    pub amount_out: u64,
    pub price: i64,
    pub pool_before: PoolState,
    pub pool_after: PoolState,
    /// Value of the recreated pool output
    pub pool_value: Value,
    /// Value of the output paid to the user
    pub user_value: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redeemer_constructors() {
        assert_eq!(SwapRedeemer::SwapA(7).to_data(), RedeemerData::new(0, vec![7]));
        assert_eq!(SwapRedeemer::SwapB(5).to_data(), RedeemerData::new(1, vec![5]));
        let add = SwapRedeemer::AddLiquidity.to_data();
        assert_eq!(add.constructor, 2);
        assert!(add.fields.is_empty());
        assert_eq!(mint_token_redeemer(), RedeemerData::unit(0));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("asset-a".parse::<TradeDirection>(), Ok(TradeDirection::SwapA));
        assert_eq!("asset-b".parse::<TradeDirection>(), Ok(TradeDirection::SwapB));
        assert!("asset-c".parse::<TradeDirection>().is_err());
        assert_eq!(
            SwapRedeemer::for_trade(TradeDirection::SwapB, 3),
            SwapRedeemer::SwapB(3)
        );
    }

    #[test]
    fn test_pool_state_from_value() {
        let quote = AssetClass::from_utf8_name(
            "c6f192a236596e2bbaac5900d67e9700dec7c77d9da626c98e0ab2ac",
            "tUSDT",
        );
        let value = Value::lovelace(50_000_000).with_asset(&quote, 100).unwrap();
        assert_eq!(
            PoolState::from_value(&value, &quote),
            PoolState {
                native_coin_balance: 50_000_000,
                asset_a_balance: 100
            }
        );
    }
}
