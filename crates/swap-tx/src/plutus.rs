//! Plutus data decoding helpers
//!
//! Thin accessors over pallas' `PlutusData` for reading datums. Constructor
//! alternatives follow the ledger's tag scheme: tags 121..=127 are
//! alternatives 0..=6, tags 1280..=1400 are 7..=127, and tag 102 carries the
//! alternative explicitly.

use pallas_codec::minicbor;
use pallas_primitives::{BigInt, Constr, PlutusData};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlutusError {
    #[error("Invalid hex: {0}")]
    Hex(String),

    #[error("Invalid CBOR: {0}")]
    Cbor(String),

    #[error("Unexpected shape: {0}")]
    Shape(String),
}

/// Decode CBOR hex into Plutus data
pub fn decode_hex(cbor_hex: &str) -> Result<PlutusData, PlutusError> {
    let bytes = hex::decode(cbor_hex).map_err(|e| PlutusError::Hex(e.to_string()))?;
    minicbor::decode::<PlutusData>(&bytes).map_err(|e| PlutusError::Cbor(e.to_string()))
}

/// Constructor alternative of a `Constr`
pub fn constr_alternative<A>(constr: &Constr<A>) -> Option<u64> {
    match constr.tag {
        121..=127 => Some(constr.tag - 121),
        1280..=1400 => Some(constr.tag - 1280 + 7),
        102 => constr.any_constructor,
        _ => None,
    }
}

/// Expect `Constr alternative [...]` and return its fields.
pub fn expect_constr(data: &PlutusData, alternative: u64) -> Result<&[PlutusData], PlutusError> {
    match data {
        PlutusData::Constr(constr) => match constr_alternative(constr) {
            Some(found) if found == alternative => Ok(&constr.fields[..]),
            found => Err(PlutusError::Shape(format!(
                "expected constructor {}, found {:?}",
                alternative, found
            ))),
        },
        other => Err(PlutusError::Shape(format!(
            "expected constructor {}, found {}",
            alternative,
            kind(other)
        ))),
    }
}

/// Expect exactly `n` fields
pub fn expect_arity(fields: &[PlutusData], n: usize) -> Result<(), PlutusError> {
    if fields.len() != n {
        return Err(PlutusError::Shape(format!(
            "expected {} field(s), found {}",
            n,
            fields.len()
        )));
    }
    Ok(())
}

/// Small (CBOR major type 0/1) integer value, if `data` is one
pub fn as_int(data: &PlutusData) -> Option<i128> {
    match data {
        PlutusData::BigInt(BigInt::Int(int)) => Some(i128::from(*int)),
        _ => None,
    }
}

/// Integer-keyed map entries, if `data` is a map whose keys are all small integers
pub fn as_int_map(data: &PlutusData) -> Option<Vec<(i128, &PlutusData)>> {
    match data {
        PlutusData::Map(pairs) => pairs
            .iter()
            .map(|(k, v)| as_int(k).map(|key| (key, v)))
            .collect(),
        _ => None,
    }
}

fn kind(data: &PlutusData) -> &'static str {
    match data {
        PlutusData::Constr(_) => "constr",
        PlutusData::Map(_) => "map",
        PlutusData::BigInt(_) => "integer",
        PlutusData::BoundedBytes(_) => "bytes",
        PlutusData::Array(_) => "list",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_datum() {
        let data = decode_hex(swap_core::constants::UNIT_DATUM_CBOR).unwrap();
        let fields = expect_constr(&data, 0).unwrap();
        assert!(fields.is_empty());
        assert!(expect_constr(&data, 1).is_err());
    }

    #[test]
    fn test_extended_constructor_tag() {
        // tag 1280 with an empty list => alternative 7
        let data = decode_hex("d9050080").unwrap();
        assert!(expect_constr(&data, 7).is_ok());
    }

    #[test]
    fn test_int_map() {
        // {0: 5, 1: -1}
        let data = decode_hex("a2000501 20".replace(' ', "").as_str()).unwrap();
        let entries = as_int_map(&data).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, 0);
        assert_eq!(as_int(entries[0].1), Some(5));
        assert_eq!(as_int(entries[1].1), Some(-1));
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode_hex("zz"), Err(PlutusError::Hex(_))));
        assert!(matches!(decode_hex("ff"), Err(PlutusError::Cbor(_))));

        let data = decode_hex("05").unwrap();
        match expect_constr(&data, 0) {
            Err(PlutusError::Shape(msg)) => assert!(msg.contains("integer")),
            other => panic!("Wrong result: {:?}", other),
        }
        assert!(expect_arity(&[], 1).is_err());
    }
}
