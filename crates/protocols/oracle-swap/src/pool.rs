//! Pool UTxO locator

use swap_core::{Address, AssetClass, LocatorError, Result};
use swap_tx::select_unique;

use ledger_client::LedgerProvider;

use crate::state::{PoolState, PoolUtxo};

/// Locate the pool UTxO by its NFT and read its balances for `quote_asset`.
pub async fn get_pool_utxo(
    provider: &dyn LedgerProvider,
    pool_address: &Address,
    pool_nft: &AssetClass,
    quote_asset: &AssetClass,
) -> Result<PoolUtxo> {
    let utxos = provider.get_utxos(pool_address).await?;
    let pool = select_unique(&utxos, pool_nft).map_err(|e| LocatorError::PoolNotFound {
        address: pool_address.to_string(),
        matches: e.matches(),
    })?;

    let state = PoolState::from_value(pool.value(), quote_asset);
    tracing::debug!(
        utxo = %pool.input,
        native = state.native_coin_balance,
        quote = state.asset_a_balance,
        "Pool UTxO located"
    );
    Ok(PoolUtxo {
        utxo: pool.clone(),
        state,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ledger_client::testing::MemoryLedger;
    use swap_core::Error;
    use swap_tx::{OutputRef, TxOutput, Utxo, Value};

    pub(crate) fn swap_address() -> Address {
        Address::new("addr_test1wqlcn3pks3xdptsjw6h9c2v2h43z8ayw8ygm6x7nhdcgchgw4g4sr")
    }

    pub(crate) fn pool_nft() -> AssetClass {
        AssetClass::from_utf8_name(
            "ce8822885d18e7d304ef0248af49359d687a94f0e3635eea14c6154e",
            "SWAP3",
        )
    }

    pub(crate) fn quote_asset() -> AssetClass {
        AssetClass::from_utf8_name(
            "c6f192a236596e2bbaac5900d67e9700dec7c77d9da626c98e0ab2ac",
            "tUSDT",
        )
    }

    pub(crate) fn pool_utxo(tx: &str, coin: u64, quote: u64) -> Utxo {
        let value = Value::lovelace(coin)
            .with_asset(&pool_nft(), 1)
            .unwrap()
            .with_asset(&quote_asset(), quote)
            .unwrap();
        Utxo::new(
            OutputRef::new(tx, 0),
            TxOutput::new(swap_address(), value).with_inline_datum("d87980"),
        )
    }

    #[tokio::test]
    async fn test_get_pool_utxo() {
        let ledger = MemoryLedger::new();
        ledger.add_utxo(pool_utxo("pool", 50_000_000, 100));

        let pool = get_pool_utxo(&ledger, &swap_address(), &pool_nft(), &quote_asset())
            .await
            .unwrap();
        assert_eq!(
            pool.state,
            PoolState {
                native_coin_balance: 50_000_000,
                asset_a_balance: 100
            }
        );
        assert_eq!(pool.utxo.input, OutputRef::new("pool", 0));
    }

    #[tokio::test]
    async fn test_pool_not_found() {
        let ledger = MemoryLedger::new();
        assert!(matches!(
            get_pool_utxo(&ledger, &swap_address(), &pool_nft(), &quote_asset()).await,
            Err(Error::Locator(LocatorError::PoolNotFound { matches: 0, .. }))
        ));

        ledger.add_utxo(pool_utxo("a", 10_000_000, 1));
        ledger.add_utxo(pool_utxo("b", 10_000_000, 1));
        assert!(matches!(
            get_pool_utxo(&ledger, &swap_address(), &pool_nft(), &quote_asset()).await,
            Err(Error::Locator(LocatorError::PoolNotFound { matches: 2, .. }))
        ));
    }
}
