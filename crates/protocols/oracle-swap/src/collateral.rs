//! Collateral management
//!
//! Script transactions need a pure-coin collateral UTxO. One is picked fresh
//! from the wallet for every transaction; if the wallet has none in the
//! configured band, a creation transaction is submitted and the wallet is
//! scanned exactly once more. Every failure along the way, including a
//! provider error on either scan, surfaces as `CollateralError::Unavailable`.

use swap_core::{Address, CollateralError, Lovelace, ProviderError, Result};
use swap_tx::{build_collateral_tx, select_collateral, Utxo};

use ledger_client::SubmissionPipeline;

/// Find a collateral UTxO at `address`, creating one if needed.
pub async fn ensure_collateral(
    pipeline: &SubmissionPipeline,
    address: &Address,
    required: Lovelace,
    tolerance: Lovelace,
) -> Result<Utxo> {
    let provider = pipeline.provider();

    let utxos = provider
        .get_utxos(address)
        .await
        .map_err(|e| scan_failed("scan", e))?;
    if let Some(found) = select_collateral(&utxos, required, tolerance) {
        tracing::debug!(utxo = %found.input, coin = found.coin(), "Using existing collateral");
        return Ok(found.clone());
    }

    tracing::info!(address = %address, amount = required, "No collateral found, creating one");
    let build = build_collateral_tx(&utxos, address, required, pipeline.config().ttl_offset)
        .map_err(|e| CollateralError::Unavailable {
            reason: e.to_string(),
        })?;

    let outcome = pipeline.submit_and_confirm(build.unsigned_tx).await;
    if !outcome.status.is_success() {
        return Err(CollateralError::Unavailable {
            reason: format!("creation transaction ended with {:?}", outcome.status),
        }
        .into());
    }

    let utxos = provider
        .get_utxos(address)
        .await
        .map_err(|e| scan_failed("re-scan", e))?;
    let created = select_collateral(&utxos, required, tolerance).ok_or_else(|| {
        CollateralError::Unavailable {
            reason: "created collateral not visible at wallet".to_string(),
        }
    })?;
    tracing::info!(utxo = %created.input, "Collateral created");
    Ok(created.clone())
}

fn scan_failed(stage: &str, e: ProviderError) -> CollateralError {
    CollateralError::Unavailable {
        reason: format!("wallet {} failed: {}", stage, e),
    }
}
