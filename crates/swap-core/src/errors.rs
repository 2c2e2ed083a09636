//! Error types for the oracle swap engine

use thiserror::Error;

/// Core errors that can occur while preparing a swap
#[derive(Debug, Error)]
pub enum Error {
    #[error("Locator error: {0}")]
    Locator(#[from] LocatorError),

    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    #[error("Collateral error: {0}")]
    Collateral(#[from] CollateralError),

    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors locating the pool or oracle UTxO, or decoding its datum
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("Oracle feed UTxO not found at {address} ({matches} matches for the oracle NFT)")]
    OracleNotFound { address: String, matches: usize },

    #[error("Pool UTxO not found at {address} ({matches} matches for the pool NFT)")]
    PoolNotFound { address: String, matches: usize },

    #[error("Aggregation state UTxO not found at {address} ({matches} matches for its NFT)")]
    AggStateNotFound { address: String, matches: usize },

    #[error("Failed to decode datum: {reason}")]
    DatumDecode { reason: String },
}

/// Errors detected while pricing a trade, before anything is built
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("Invalid oracle price: {price}")]
    InvalidPrice { price: i64 },

    #[error("Trade of {amount} converts to less than 1 unit of {target}")]
    BelowMinimumTradeQuantity { amount: u64, target: String },

    #[error("Insufficient pool liquidity ({asset}): need {required}, have {available}")]
    InsufficientPoolLiquidity {
        asset: String,
        required: u128,
        available: u64,
    },

    #[error("Insufficient user funds ({asset}): need {required}, have {available}")]
    InsufficientUserFunds {
        asset: String,
        required: u64,
        available: u64,
    },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },
}

/// Collateral lifecycle errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollateralError {
    #[error("Collateral unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Local inconsistencies found while assembling a transaction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("Pool UTxO {utxo} does not hold the pool NFT")]
    MissingPoolNft { utxo: String },

    #[error("Collateral UTxO {utxo} holds more than the native coin")]
    CollateralNotPureCoin { utxo: String },

    #[error("Failed to build transaction: {message}")]
    BuildFailed { message: String },
}

/// Ledger provider (indexer or node) errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Provider unreachable at {url}")]
    Unreachable { url: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Provider returned error: {message}")]
    ApiError { status: Option<u16>, message: String },

    #[error("Transaction rejected by the ledger: {message}")]
    Rejected { message: String },

    #[error("Ledger reported insufficient funds: {message}")]
    InsufficientFunds { message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// Errors raised by the external signer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("Insufficient funds to balance transaction: {message}")]
    InsufficientFunds { message: String },

    #[error("UTxO selection failed: {message}")]
    UtxoSelection { message: String },

    #[error("Signing failed: {message}")]
    Failed { message: String },
}

/// Result type alias for swap operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Locator(e) => e.error_code(),
            Self::Pricing(e) => e.error_code(),
            Self::Collateral(_) => "collateral_unavailable",
            Self::Assembly(_) => "assembly_error",
            Self::Provider(e) => e.error_code(),
            Self::Config(_) => "config_error",
        }
    }
}

impl LocatorError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::OracleNotFound { .. } => "oracle_not_found",
            Self::PoolNotFound { .. } => "pool_not_found",
            Self::AggStateNotFound { .. } => "aggstate_not_found",
            Self::DatumDecode { .. } => "datum_decode_error",
        }
    }
}

impl PricingError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPrice { .. } => "invalid_price",
            Self::BelowMinimumTradeQuantity { .. } => "below_minimum_trade_quantity",
            Self::InsufficientPoolLiquidity { .. } => "insufficient_pool_liquidity",
            Self::InsufficientUserFunds { .. } => "insufficient_user_funds",
            Self::InvalidAmount { .. } => "invalid_amount",
        }
    }
}

impl ProviderError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "provider_unreachable",
            Self::NotFound { .. } => "not_found",
            Self::ApiError { .. } => "provider_api_error",
            Self::Rejected { .. } => "tx_rejected",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::ParseError(_) => "parse_error",
            Self::Timeout { .. } => "provider_timeout",
        }
    }

    /// Whether this is the "transaction not (yet) seen" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
