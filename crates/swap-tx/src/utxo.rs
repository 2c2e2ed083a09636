//! UTxO and output types as reported by a ledger provider

use std::fmt;

use serde::{Deserialize, Serialize};
use swap_core::{Address, AssetClass, TxId};

use crate::value::{MultiAsset, Value};

/// Reference to a transaction output: `(tx_id, index)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRef {
    pub tx_id: TxId,
    pub index: u32,
}

impl OutputRef {
    pub fn new(tx_id: impl Into<String>, index: u32) -> Self {
        Self {
            tx_id: TxId::new(tx_id),
            index,
        }
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_id, self.index)
    }
}

/// Datum attached to an output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Datum {
    /// Inline datum, CBOR hex
    Inline(String),
    /// Datum hash only; the datum itself lives off the output
    Hash(String),
}

/// A transaction output (existing or to be created)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxOutput {
    pub address: Address,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum: Option<Datum>,
    /// Hash of a reference script stored in this output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_ref: Option<String>,
}

impl TxOutput {
    pub fn new(address: Address, value: Value) -> Self {
        Self {
            address,
            value,
            datum: None,
            script_ref: None,
        }
    }

    pub fn with_inline_datum(mut self, cbor_hex: impl Into<String>) -> Self {
        self.datum = Some(Datum::Inline(cbor_hex.into()));
        self
    }

    /// Inline datum CBOR hex, if the output carries one
    pub fn inline_datum(&self) -> Option<&str> {
        match &self.datum {
            Some(Datum::Inline(cbor)) => Some(cbor),
            _ => None,
        }
    }
}

/// An unspent output together with its reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    pub input: OutputRef,
    pub output: TxOutput,
}

impl Utxo {
    pub fn new(input: OutputRef, output: TxOutput) -> Self {
        Self { input, output }
    }

    pub fn value(&self) -> &Value {
        &self.output.value
    }

    pub fn coin(&self) -> u64 {
        self.output.value.coin
    }

    /// Quantity of `asset` held by this UTxO
    pub fn quantity_of(&self, asset: &AssetClass) -> u64 {
        self.output.value.multi_asset.get(asset)
    }

    /// Bundle inclusion against this UTxO's tokens
    pub fn contains(&self, bundle: &MultiAsset) -> bool {
        self.output.value.multi_asset.contains(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_ref_display() {
        let r = OutputRef::new("ab".repeat(32), 3);
        assert_eq!(r.to_string(), format!("{}#3", "ab".repeat(32)));
    }

    #[test]
    fn test_inline_datum_accessor() {
        let addr = Address::new("addr_test1vr2jvlvw62kv82x8gn0pewn6n5r82m6zxxn6c7vp04t9avs3wgpxv");
        let plain = TxOutput::new(addr.clone(), Value::lovelace(1));
        assert_eq!(plain.inline_datum(), None);

        let inline = plain.clone().with_inline_datum("d87980");
        assert_eq!(inline.inline_datum(), Some("d87980"));

        let hashed = TxOutput {
            datum: Some(Datum::Hash("00".repeat(32))),
            ..plain
        };
        assert_eq!(hashed.inline_datum(), None);
    }

    #[test]
    fn test_datum_json_shape() {
        let json = serde_json::to_value(Datum::Inline("d87980".into())).unwrap();
        assert_eq!(json["type"], "inline");
        assert_eq!(json["value"], "d87980");
    }
}
