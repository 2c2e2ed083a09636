//! Oracle feed datum
//!
//! Wire shape (CBOR, inline datum on the feed UTxO):
//!
//! ```text
//! Constr 0 [ Constr 2 [ Map { 0: price, 1: generated_at, 2: expiry } ] ]
//! ```
//!
//! `price` is scaled by the coin precision; the two timestamps are POSIX
//! milliseconds.

use pallas_primitives::PlutusData;
use serde::{Deserialize, Serialize};
use swap_core::LocatorError;
use swap_tx::plutus::{as_int, as_int_map, decode_hex, expect_arity, expect_constr};
use swap_tx::PlutusError;

const PRICE_KEY: i128 = 0;
const GENERATED_AT_KEY: i128 = 1;
const EXPIRY_KEY: i128 = 2;

/// Constructor alternative wrapping the price map
const PRICE_DATA_CONSTR: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraclePriceDatum {
    pub price: i64,
    pub generated_at: i64,
    pub expiry: i64,
}

impl OraclePriceDatum {
    pub fn from_cbor_hex(cbor_hex: &str) -> Result<Self, LocatorError> {
        let data = decode_hex(cbor_hex).map_err(decode_error)?;
        Self::from_plutus(&data)
    }

    pub fn from_plutus(data: &PlutusData) -> Result<Self, LocatorError> {
        let outer = expect_constr(data, 0).map_err(decode_error)?;
        expect_arity(outer, 1).map_err(decode_error)?;

        let inner = expect_constr(&outer[0], PRICE_DATA_CONSTR).map_err(decode_error)?;
        expect_arity(inner, 1).map_err(decode_error)?;

        let entries = as_int_map(&inner[0]).ok_or_else(|| LocatorError::DatumDecode {
            reason: "price data is not an integer-keyed map".to_string(),
        })?;

        let mut price = None;
        let mut generated_at = None;
        let mut expiry = None;
        for (key, value) in entries {
            let slot = match key {
                PRICE_KEY => &mut price,
                GENERATED_AT_KEY => &mut generated_at,
                EXPIRY_KEY => &mut expiry,
                other => {
                    return Err(LocatorError::DatumDecode {
                        reason: format!("unexpected price map key {}", other),
                    })
                }
            };
            if slot.is_some() {
                return Err(LocatorError::DatumDecode {
                    reason: format!("duplicate price map key {}", key),
                });
            }
            *slot = Some(int_field(key, value)?);
        }

        Ok(Self {
            price: require(price, "price")?,
            generated_at: require(generated_at, "generated_at")?,
            expiry: require(expiry, "expiry")?,
        })
    }
}

fn int_field(key: i128, value: &PlutusData) -> Result<i64, LocatorError> {
    as_int(value)
        .and_then(|v| i64::try_from(v).ok())
        .ok_or_else(|| LocatorError::DatumDecode {
            reason: format!("price map key {} is not a 64-bit integer", key),
        })
}

fn require(field: Option<i64>, name: &str) -> Result<i64, LocatorError> {
    field.ok_or_else(|| LocatorError::DatumDecode {
        reason: format!("price map is missing {}", name),
    })
}

fn decode_error(e: PlutusError) -> LocatorError {
    LocatorError::DatumDecode {
        reason: e.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// price 2_000_000, generated_at 1_700_000_000_000, expiry 1_700_000_600_000
    pub(crate) const FEED_DATUM: &str =
        "d87981d87b81a3001a001e8480011b0000018bcfe56800021b0000018bcfee8fc0";

    #[test]
    fn test_decode_feed_datum() {
        let datum = OraclePriceDatum::from_cbor_hex(FEED_DATUM).unwrap();
        assert_eq!(
            datum,
            OraclePriceDatum {
                price: 2_000_000,
                generated_at: 1_700_000_000_000,
                expiry: 1_700_000_600_000,
            }
        );
    }

    #[test]
    fn test_decode_small_and_negative_values() {
        let datum = OraclePriceDatum::from_cbor_hex("d87981d87b81a3000301010202").unwrap();
        assert_eq!((datum.price, datum.generated_at, datum.expiry), (3, 1, 2));

        // A negative price still decodes; rejecting it is the pricer's job
        let datum = OraclePriceDatum::from_cbor_hex("d87981d87b81a3002001010202").unwrap();
        assert_eq!(datum.price, -1);
    }

    #[test]
    fn test_decode_rejects_other_shapes() {
        let cases = [
            // unit datum
            "d87980",
            // Constr 0 [ Constr 1 [ map ] ]
            "d87981d87a81a3000301010202",
            // missing expiry
            "d87981d87b81a200030101",
            // unknown key 3
            "d87981d87b81a4000301010202030a",
            // not hex
            "zz",
            // truncated
            "d87981d87b81a300",
        ];
        for hex in cases {
            assert!(
                matches!(
                    OraclePriceDatum::from_cbor_hex(hex),
                    Err(LocatorError::DatumDecode { .. })
                ),
                "{} should not decode",
                hex
            );
        }
    }
}
