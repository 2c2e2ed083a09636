//! Configuration types for the oracle swap engine
//!
//! Everything that used to be a process-wide constant (precision, addresses,
//! NFTs, retry policy) lives here and is handed to components explicitly.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::constants;
use crate::{Address, AssetClass, Error, Lovelace, Network, Result};

/// Ledger provider backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Hosted indexer API
    Blockfrost {
        project_id: String,
        /// Overrides the per-network default endpoint
        #[serde(default)]
        base_url: Option<String>,
    },
    /// Self-hosted Kupo (queries) + Ogmios (submission)
    Kupo { kupo_url: String, ogmios_url: String },
}

impl ProviderConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blockfrost { .. } => "blockfrost",
            Self::Kupo { .. } => "kupo",
        }
    }
}

/// On-chain identity of the swap and the oracle it trades against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    pub oracle_address: Address,
    pub swap_address: Address,
    /// NFT that singles out the pool UTxO at the swap address
    pub pool_nft: AssetClass,
    /// NFT that singles out the feed UTxO at the oracle address
    pub oracle_nft: AssetClass,
    /// The traded (non-native) asset held by the pool
    pub quote_asset: AssetClass,
    /// Plutus V2 spending script, CBOR hex
    pub swap_script_cbor: String,
    /// Plutus V2 minting script for the pool NFT, CBOR hex
    #[serde(default)]
    pub mint_script_cbor: Option<String>,
    /// Asset name (UTF-8) minted by `start-swap`
    #[serde(default = "default_swap_nft_name")]
    pub swap_nft_name: String,
    /// On-demand validation requests to the oracle; absent disables them
    #[serde(default)]
    pub odv: Option<OdvConfig>,
}

/// Oracle aggregation state and the token its nodes are paid in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OdvConfig {
    /// NFT that singles out the aggregation-state UTxO at the oracle address
    pub aggstate_nft: AssetClass,
    pub payment_token: AssetClass,
    /// Feed pricing the payment token, used to scale the node fees
    #[serde(default)]
    pub rate_oracle: Option<RateOracleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateOracleConfig {
    pub address: Address,
    pub nft: AssetClass,
}

fn default_swap_nft_name() -> String {
    "SWAP3".to_string()
}

/// Wallet the CLI trades from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    pub address: Address,
}

/// External signing command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Pricing and collateral parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapParams {
    #[serde(default = "default_coin_precision")]
    pub coin_precision: u64,
    #[serde(default = "default_min_utxo_lovelace")]
    pub min_utxo_lovelace: Lovelace,
    #[serde(default = "default_collateral_amount")]
    pub collateral_amount: Lovelace,
    #[serde(default = "default_collateral_tolerance")]
    pub collateral_tolerance: Lovelace,
}

fn default_coin_precision() -> u64 {
    constants::COIN_PRECISION
}

fn default_min_utxo_lovelace() -> Lovelace {
    constants::MIN_UTXO_LOVELACE
}

fn default_collateral_amount() -> Lovelace {
    constants::COLLATERAL_LOVELACE
}

fn default_collateral_tolerance() -> Lovelace {
    constants::COLLATERAL_TOLERANCE
}

impl Default for SwapParams {
    fn default() -> Self {
        Self {
            coin_precision: default_coin_precision(),
            min_utxo_lovelace: default_min_utxo_lovelace(),
            collateral_amount: default_collateral_amount(),
            collateral_tolerance: default_collateral_tolerance(),
        }
    }
}

/// Submission and confirmation-polling policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_ttl_offset")]
    pub ttl_offset: u64,
}

fn default_poll_interval_secs() -> u64 {
    20
}

fn default_max_attempts() -> u32 {
    10
}

fn default_ttl_offset() -> u64 {
    constants::TTL_OFFSET_SLOTS
}

impl SubmissionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_attempts: default_max_attempts(),
            ttl_offset: default_ttl_offset(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network (mainnet, preprod or preview)
    #[serde(default = "default_network")]
    pub network: Network,

    /// Ledger provider backend
    pub provider: ProviderConfig,

    pub contracts: ContractsConfig,

    pub wallet: WalletConfig,

    pub signer: SignerConfig,

    #[serde(default)]
    pub swap: SwapParams,

    #[serde(default)]
    pub submission: SubmissionConfig,
}

fn default_network() -> Network {
    Network::Preprod
}

impl AppConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AppConfig =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make pricing or polling meaningless
    pub fn validate(&self) -> Result<()> {
        if self.swap.coin_precision == 0 {
            return Err(Error::Config("coin_precision must be positive".into()));
        }
        if self.swap.collateral_tolerance > self.swap.collateral_amount {
            return Err(Error::Config(format!(
                "collateral_tolerance ({}) exceeds collateral_amount ({})",
                self.swap.collateral_tolerance, self.swap.collateral_amount
            )));
        }
        if self.submission.max_attempts == 0 {
            return Err(Error::Config("max_attempts must be at least 1".into()));
        }
        if self.contracts.pool_nft == self.contracts.oracle_nft {
            return Err(Error::Config(
                "pool_nft and oracle_nft must be different assets".into(),
            ));
        }
        if let Some(odv) = &self.contracts.odv {
            if odv.aggstate_nft == self.contracts.oracle_nft {
                return Err(Error::Config(
                    "odv.aggstate_nft and oracle_nft must be different assets".into(),
                ));
            }
        }
        Ok(())
    }
}
