//! ledger-client: Ledger provider backends and transaction submission
//!
//! The core talks to the ledger through [`LedgerProvider`], a three-call
//! surface (UTxO query, submission, presence check) with two backends:
//! a Blockfrost indexer and a Kupo + Ogmios node stack. Which one is used is
//! decided once, at startup, by [`connect`].

pub mod blockfrost;
pub mod clock;
pub mod kupo;
pub mod pipeline;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use swap_core::{Address, Network, ProviderConfig, ProviderError, SignerError, TxId};
use swap_tx::{SignedTx, UnsignedTx, Utxo};

pub use blockfrost::BlockfrostProvider;
pub use clock::{Sleeper, TokioSleeper};
pub use kupo::KupoOgmiosProvider;
pub use pipeline::{PipelineState, SubmissionOutcome, SubmissionPipeline, SubmissionStatus};

/// Default timeout for provider API calls (30 seconds).
const PROVIDER_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Read/submit access to the ledger
#[async_trait]
pub trait LedgerProvider: Send + Sync {
    /// Backend name, for logs
    fn name(&self) -> &'static str;

    /// Current unspent outputs at `address`
    async fn get_utxos(&self, address: &Address) -> Result<Vec<Utxo>>;

    /// Submit a witnessed transaction, returning its ID
    async fn submit(&self, tx: &SignedTx) -> Result<TxId>;

    /// Whether `tx_id` is on chain.
    ///
    /// `Err(ProviderError::NotFound)` means the ledger has not seen the
    /// transaction (yet); `Ok(false)` means it is known but not yet settled.
    async fn is_confirmed(&self, tx_id: &TxId) -> Result<bool>;
}

/// Turns an unsigned plan into a witnessed transaction.
///
/// Key material stays inside the implementation.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, tx: &UnsignedTx) -> std::result::Result<SignedTx, SignerError>;
}

/// Build the configured provider backend
pub fn connect(config: &ProviderConfig, network: Network) -> Result<Arc<dyn LedgerProvider>> {
    let provider: Arc<dyn LedgerProvider> = match config {
        ProviderConfig::Blockfrost {
            project_id,
            base_url,
        } => {
            let url = base_url
                .clone()
                .unwrap_or_else(|| network.blockfrost_url().to_string());
            Arc::new(BlockfrostProvider::new(url, project_id.clone())?)
        }
        ProviderConfig::Kupo {
            kupo_url,
            ogmios_url,
        } => Arc::new(KupoOgmiosProvider::new(kupo_url.clone(), ogmios_url.clone())?),
    };
    tracing::info!(backend = provider.name(), network = %network, "Ledger provider ready");
    Ok(provider)
}

/// Shared HTTP client for both backends
fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("oracle-swap/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::ApiError {
            status: None,
            message: format!("Failed to build HTTP client: {}", e),
        })
}

/// Wrap a provider call with a timeout.
async fn timed_request<T>(
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(PROVIDER_REQUEST_TIMEOUT, fut)
        .await
        .map_err(|_| ProviderError::Timeout {
            seconds: PROVIDER_REQUEST_TIMEOUT.as_secs(),
        })?
}

/// Map a transport-level reqwest failure
fn transport_error(url: &str, e: reqwest::Error) -> ProviderError {
    if e.is_connect() {
        ProviderError::Unreachable {
            url: url.to_string(),
        }
    } else if e.is_decode() {
        ProviderError::ParseError(e.to_string())
    } else {
        ProviderError::ApiError {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

/// Classify a ledger rejection message.
///
/// Both backends surface the ledger's failure names verbatim; a value
/// conservation or "insufficient" failure is a funds problem, anything else
/// (bad/spent inputs, collateral, script failure) is a rejection.
fn classify_rejection(message: String) -> ProviderError {
    let lower = message.to_lowercase();
    if lower.contains("valuenotconserved") || lower.contains("insufficient") {
        ProviderError::InsufficientFunds { message }
    } else {
        ProviderError::Rejected { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rejection() {
        assert!(matches!(
            classify_rejection("ValueNotConservedUTxO ...".into()),
            ProviderError::InsufficientFunds { .. }
        ));
        assert!(matches!(
            classify_rejection("BadInputsUTxO (fromList [...])".into()),
            ProviderError::Rejected { .. }
        ));
        assert!(matches!(
            classify_rejection("InsufficientCollateral".into()),
            ProviderError::InsufficientFunds { .. }
        ));
    }

    #[tokio::test]
    async fn test_timed_request_passes_through() {
        let ok = timed_request(async { Ok::<_, ProviderError>(7) }).await;
        assert_eq!(ok, Ok(7));

        let err = timed_request(async {
            Err::<u8, _>(ProviderError::NotFound {
                resource: "x".into(),
            })
        })
        .await;
        assert!(err.unwrap_err().is_not_found());
    }

    #[test]
    fn test_connect_selects_backend() {
        let bf = connect(
            &ProviderConfig::Blockfrost {
                project_id: "preprod123".into(),
                base_url: None,
            },
            Network::Preprod,
        )
        .unwrap();
        assert_eq!(bf.name(), "blockfrost");

        let kupo = connect(
            &ProviderConfig::Kupo {
                kupo_url: "http://localhost:1442".into(),
                ogmios_url: "http://localhost:1337".into(),
            },
            Network::Preprod,
        )
        .unwrap();
        assert_eq!(kupo.name(), "kupo+ogmios");
    }
}
