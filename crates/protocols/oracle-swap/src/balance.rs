//! Pool and user output values
//!
//! Deltas are signed from the pool's point of view: positive means the pool
//! receives. Everything except the native coin and the quote asset (the pool
//! NFT in particular) passes through untouched.

use swap_core::{AssetClass, Lovelace, PricingError};
use swap_tx::Value;

const NATIVE_ASSET: &str = "lovelace";

/// New pool value after moving `quote_delta` quote units and `native_delta`
/// lovelace.
pub fn apply(
    pool_value: &Value,
    quote_asset: &AssetClass,
    quote_delta: i128,
    native_delta: i128,
) -> Result<Value, PricingError> {
    let quote_before = pool_value.multi_asset.get(quote_asset);
    let quote_after = shift(quote_before, quote_delta, &quote_asset.to_string())?;
    let coin_after = shift(pool_value.coin, native_delta, NATIVE_ASSET)?;

    let mut next = pool_value.clone();
    next.coin = coin_after;
    next.multi_asset.set(quote_asset, quote_after);
    Ok(next)
}

/// Output paid to a user selling quote units: the bought coins, as lovelace
pub fn swap_a_user_value(native_out_lovelace: Lovelace) -> Value {
    Value::lovelace(native_out_lovelace)
}

/// Output paid to a user selling native coin: min-UTxO lovelace plus the
/// bought quote units
pub fn swap_b_user_value(
    quote_asset: &AssetClass,
    quote_out: u64,
    min_utxo_lovelace: Lovelace,
) -> Result<Value, PricingError> {
    Value::lovelace(min_utxo_lovelace)
        .with_asset(quote_asset, quote_out)
        .map_err(|e| PricingError::InvalidAmount {
            message: e.to_string(),
        })
}

fn shift(balance: u64, delta: i128, asset: &str) -> Result<u64, PricingError> {
    let next = i128::from(balance) + delta;
    if next < 0 {
        return Err(PricingError::InsufficientPoolLiquidity {
            asset: asset.to_string(),
            required: delta.unsigned_abs(),
            available: balance,
        });
    }
    u64::try_from(next).map_err(|_| PricingError::InvalidAmount {
        message: format!("{} balance overflows", asset),
    })
}
