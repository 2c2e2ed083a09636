//! Core type definitions for the oracle swap engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction ID (32 bytes, hex-encoded)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl TxId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bech32 Cardano address (payment or script)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this is a mainnet address
    pub fn is_mainnet(&self) -> bool {
        self.0.starts_with("addr1")
    }

    /// Check if this is a testnet (preprod/preview) address
    pub fn is_testnet(&self) -> bool {
        self.0.starts_with("addr_test1")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Minting policy ID (28 bytes, hex-encoded)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(pub String);

impl PolicyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A native token class: policy ID plus hex-encoded asset name.
///
/// The ledger's native coin is not an `AssetClass`; it is carried separately
/// as the `coin` field of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetClass {
    pub policy_id: PolicyId,
    /// Hex-encoded asset name bytes (may be empty)
    #[serde(default)]
    pub asset_name: String,
}

impl AssetClass {
    pub fn new(policy_id: impl Into<String>, asset_name_hex: impl Into<String>) -> Self {
        Self {
            policy_id: PolicyId::new(policy_id),
            asset_name: asset_name_hex.into(),
        }
    }

    /// Build an asset class from a human-readable (UTF-8) asset name.
    pub fn from_utf8_name(policy_id: impl Into<String>, name: &str) -> Self {
        Self::new(policy_id, hex::encode(name.as_bytes()))
    }

    /// Blockfrost-style unit: policy ID immediately followed by the asset name hex.
    pub fn unit(&self) -> String {
        format!("{}{}", self.policy_id, self.asset_name)
    }

    /// Parse a Blockfrost-style unit. Policy IDs are always 56 hex characters.
    pub fn from_unit(unit: &str) -> Option<Self> {
        if unit.len() < POLICY_ID_HEX_LEN || !unit.is_char_boundary(POLICY_ID_HEX_LEN) {
            return None;
        }
        let (policy, name) = unit.split_at(POLICY_ID_HEX_LEN);
        Some(Self::new(policy, name))
    }

    /// Parse a Kupo-style key: `policy.asset_name` (the name part may be absent).
    pub fn from_dotted(key: &str) -> Option<Self> {
        match key.split_once('.') {
            Some((policy, name)) if policy.len() == POLICY_ID_HEX_LEN => {
                Some(Self::new(policy, name))
            }
            None if key.len() == POLICY_ID_HEX_LEN => Some(Self::new(key, "")),
            _ => None,
        }
    }

    /// Asset name decoded as UTF-8, when it is printable text.
    pub fn display_name(&self) -> String {
        hex::decode(&self.asset_name)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .filter(|s| !s.is_empty() && !s.chars().any(char::is_control))
            .unwrap_or_else(|| self.asset_name.clone())
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.policy_id, self.asset_name)
    }
}

/// Length of a hex-encoded policy ID
pub const POLICY_ID_HEX_LEN: usize = 56;

/// Network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Preprod,
    Preview,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Preprod => "preprod",
            Self::Preview => "preview",
        }
    }

    /// Default Blockfrost endpoint for this network
    pub fn blockfrost_url(&self) -> &'static str {
        match self {
            Self::Mainnet => "https://cardano-mainnet.blockfrost.io/api/v0",
            Self::Preprod => "https://cardano-preprod.blockfrost.io/api/v0",
            Self::Preview => "https://cardano-preview.blockfrost.io/api/v0",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lovelace amount (1 ADA = 1_000_000 lovelace)
pub type Lovelace = u64;

/// Constants
pub mod constants {
    use super::Lovelace;

    /// Fixed-point scale for oracle prices and 1 ADA in lovelace
    pub const COIN_PRECISION: u64 = 1_000_000;

    /// Minimum lovelace attached to an output carrying tokens
    pub const MIN_UTXO_LOVELACE: Lovelace = 2_000_000;

    /// Default collateral size
    pub const COLLATERAL_LOVELACE: Lovelace = 5_000_000;

    /// Default absolute tolerance around the collateral size
    pub const COLLATERAL_TOLERANCE: Lovelace = 1_000_000;

    /// CBOR of the unit Plutus datum `Constr 0 []`
    pub const UNIT_DATUM_CBOR: &str = "d87980";

    /// Validity window (in slots) granted to built transactions
    pub const TTL_OFFSET_SLOTS: u64 = 120;
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = "fc1c4d7ba3e7d7c3a8b6e2c0b2d4f6a8c0e2f4a6b8d0e2f4a6b8d0e2";

    #[test]
    fn test_address_network_detection() {
        let mainnet = Address::new("addr1qx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzer3n0d3vllmyqwsx5wktcd8cc3sq835lu7drv2xwl2wywfgse35a3x");
        assert!(mainnet.is_mainnet());
        assert!(!mainnet.is_testnet());

        let testnet = Address::new("addr_test1wz0zu8eqv3a9vm3ytqq9m6nwr6pr2avz85f5d6yayme3l6cqhafe0");
        assert!(testnet.is_testnet());
        assert!(!testnet.is_mainnet());
    }

    #[test]
    fn test_network_display() {
        assert_eq!(Network::Mainnet.as_str(), "mainnet");
        assert_eq!(Network::Preprod.to_string(), "preprod");
    }

    #[test]
    fn test_asset_class_unit_forms() {
        let asset = AssetClass::from_utf8_name(POLICY, "tUSDT");
        assert_eq!(asset.asset_name, "7455534454");
        assert_eq!(asset.unit(), format!("{}7455534454", POLICY));
        assert_eq!(AssetClass::from_unit(&asset.unit()), Some(asset.clone()));
        assert_eq!(
            AssetClass::from_dotted(&format!("{}.7455534454", POLICY)),
            Some(asset.clone())
        );
        assert_eq!(asset.display_name(), "tUSDT");
    }

    #[test]
    fn test_asset_class_rejects_short_policy() {
        assert!(AssetClass::from_unit("abcd").is_none());
        assert!(AssetClass::from_dotted("abcd.00").is_none());
        assert_eq!(
            AssetClass::from_dotted(POLICY),
            Some(AssetClass::new(POLICY, ""))
        );
    }
}
