//! Oracle Swap Calculator
//!
//! Fixed-price conversion between the native coin and the quote asset.
//!
//! The oracle price is native coin per quote unit, scaled by the coin
//! precision P (10^6):
//!
//! - native → quote: `floor(amount_native * P / price)`
//! - quote → native: `floor(amount_quote * price / P)`
//!
//! Native amounts here are whole coins, not lovelace. Rounding is always
//! down, so the pool never pays out more than the price allows.

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use swap_core::PricingError;

pub const NATIVE_TARGET: &str = "native coin";
pub const QUOTE_TARGET: &str = "quote asset";

/// Quote units bought with `amount_native` whole coins
pub fn native_to_quote(amount_native: u64, price: i64, precision: u64) -> Result<u64, PricingError> {
    let price = checked_price(price)?;
    require_positive(amount_native)?;

    let quote = BigInt::from(amount_native) * BigInt::from(precision) / price;
    to_target(quote, amount_native, QUOTE_TARGET)
}

/// Whole native coins bought with `amount_quote` quote units
pub fn quote_to_native(amount_quote: u64, price: i64, precision: u64) -> Result<u64, PricingError> {
    let price = checked_price(price)?;
    require_positive(amount_quote)?;
    if precision == 0 {
        return Err(PricingError::InvalidAmount {
            message: "coin precision must be positive".to_string(),
        });
    }

    let native = BigInt::from(amount_quote) * price / BigInt::from(precision);
    to_target(native, amount_quote, NATIVE_TARGET)
}

/// Whole coins to lovelace
pub fn to_lovelace(whole: u64, precision: u64) -> Result<u64, PricingError> {
    whole
        .checked_mul(precision)
        .ok_or_else(|| PricingError::InvalidAmount {
            message: format!("{} coins overflows lovelace", whole),
        })
}

/// Human-readable price (native coin per quote unit)
pub fn display_price(price: i64, precision: u64) -> f64 {
    if precision == 0 {
        return 0.0;
    }
    price as f64 / precision as f64
}

fn checked_price(price: i64) -> Result<BigInt, PricingError> {
    if price <= 0 {
        return Err(PricingError::InvalidPrice { price });
    }
    Ok(BigInt::from(price))
}

fn require_positive(amount: u64) -> Result<(), PricingError> {
    if amount == 0 {
        return Err(PricingError::InvalidAmount {
            message: "trade amount must be positive".to_string(),
        });
    }
    Ok(())
}

fn to_target(result: BigInt, amount: u64, target: &str) -> Result<u64, PricingError> {
    if result.is_zero() {
        return Err(PricingError::BelowMinimumTradeQuantity {
            amount,
            target: target.to_string(),
        });
    }
    result.to_u64().ok_or_else(|| PricingError::InvalidAmount {
        message: format!("{} of {} does not fit in 64 bits", result, target),
    })
}
