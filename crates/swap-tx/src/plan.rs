//! Unsigned Transaction Plans
//!
//! Defines the JSON structure handed to the external signer. The plan names
//! every input, output, reference input, script and redeemer; the signer is
//! responsible for coin selection from `input_addresses`, fee balancing,
//! CBOR serialization and witnessing.

use serde::{Deserialize, Serialize};
use swap_core::{Address, TxId};

use crate::utxo::{OutputRef, TxOutput, Utxo};

/// What a redeemer is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedeemerPurpose {
    Spend,
    Mint,
}

/// Redeemer payload: `Constr constructor [fields...]` with integer fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemerData {
    pub constructor: u64,
    #[serde(default)]
    pub fields: Vec<u64>,
}

impl RedeemerData {
    pub fn new(constructor: u64, fields: Vec<u64>) -> Self {
        Self {
            constructor,
            fields,
        }
    }

    /// Constructor with no fields
    pub fn unit(constructor: u64) -> Self {
        Self::new(constructor, vec![])
    }
}

/// Script execution budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExUnits {
    pub mem: u64,
    pub steps: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redeemer {
    pub purpose: RedeemerPurpose,
    pub data: RedeemerData,
    /// Left to the signer's evaluator when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ex_units: Option<ExUnits>,
}

impl Redeemer {
    pub fn spend(data: RedeemerData) -> Self {
        Self {
            purpose: RedeemerPurpose::Spend,
            data,
            ex_units: None,
        }
    }

    pub fn mint(data: RedeemerData) -> Self {
        Self {
            purpose: RedeemerPurpose::Mint,
            data,
            ex_units: None,
        }
    }

    pub fn with_ex_units(mut self, mem: u64, steps: u64) -> Self {
        self.ex_units = Some(ExUnits { mem, steps });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlutusVersion {
    V2,
}

/// A Plutus script carried in the transaction witness set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlutusScript {
    pub version: PlutusVersion,
    pub cbor_hex: String,
}

impl PlutusScript {
    pub fn v2(cbor_hex: impl Into<String>) -> Self {
        Self {
            version: PlutusVersion::V2,
            cbor_hex: cbor_hex.into(),
        }
    }
}

/// A script-locked input spent under a redeemer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptInput {
    pub utxo: Utxo,
    pub script: PlutusScript,
    pub redeemer: Redeemer,
}

/// One minted (or burned, if negative) asset under the mint policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintEntry {
    /// Hex-encoded asset name
    pub asset_name: String,
    pub quantity: i64,
}

/// Minting under a single Plutus policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintAction {
    pub policy_script: PlutusScript,
    pub assets: Vec<MintEntry>,
    pub redeemer: Redeemer,
}

/// Complete unsigned transaction plan
///
/// Field order mirrors assembly order: script inputs, explicit inputs,
/// balancing addresses, outputs, reference inputs, collateral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTx {
    pub script_inputs: Vec<ScriptInput>,
    /// Wallet UTxOs that must be spent
    pub inputs: Vec<Utxo>,
    /// Addresses the signer may pick extra inputs from to balance the tx
    pub input_addresses: Vec<Address>,
    pub outputs: Vec<TxOutput>,
    /// Read-only inputs (datums visible to scripts, not spent)
    pub reference_inputs: Vec<Utxo>,
    pub collateral: Vec<Utxo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mint: Option<MintAction>,
    /// Transaction metadata keyed by label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub change_address: Address,
    /// Slots after the current tip before the tx expires
    pub ttl_offset: u64,
}

impl UnsignedTx {
    /// Create an empty plan returning change to `change_address`
    pub fn new(change_address: Address, ttl_offset: u64) -> Self {
        Self {
            script_inputs: vec![],
            inputs: vec![],
            input_addresses: vec![],
            outputs: vec![],
            reference_inputs: vec![],
            collateral: vec![],
            mint: None,
            metadata: None,
            change_address,
            ttl_offset,
        }
    }

    pub fn add_script_input(&mut self, utxo: Utxo, script: PlutusScript, redeemer: Redeemer) {
        self.script_inputs.push(ScriptInput {
            utxo,
            script,
            redeemer,
        });
    }

    pub fn add_input(&mut self, utxo: Utxo) {
        self.inputs.push(utxo);
    }

    pub fn add_input_address(&mut self, address: Address) {
        if !self.input_addresses.contains(&address) {
            self.input_addresses.push(address);
        }
    }

    pub fn add_output(&mut self, output: TxOutput) {
        self.outputs.push(output);
    }

    pub fn add_reference_input(&mut self, utxo: Utxo) {
        self.reference_inputs.push(utxo);
    }

    pub fn add_collateral(&mut self, utxo: Utxo) {
        self.collateral.push(utxo);
    }

    /// Every output reference this plan will consume
    pub fn spent_refs(&self) -> Vec<&OutputRef> {
        self.script_inputs
            .iter()
            .map(|s| &s.utxo.input)
            .chain(self.inputs.iter().map(|u| &u.input))
            .collect()
    }

    /// Whether any input is script-locked (and therefore needs collateral)
    pub fn requires_collateral(&self) -> bool {
        !self.script_inputs.is_empty() || self.mint.is_some()
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A witnessed transaction ready for submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTx {
    pub tx_id: TxId,
    pub cbor_hex: String,
}

impl SignedTx {
    pub fn new(tx_id: impl Into<String>, cbor_hex: impl Into<String>) -> Self {
        Self {
            tx_id: TxId::new(tx_id),
            cbor_hex: cbor_hex.into(),
        }
    }

    /// Raw transaction bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(&self.cbor_hex)
    }
}
