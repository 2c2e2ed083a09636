//! Oracle feed reader

use serde::Serialize;
use swap_core::{Address, AssetClass, LocatorError, Result};
use swap_tx::{select_unique, Datum, Utxo};

use ledger_client::LedgerProvider;

use crate::datum::OraclePriceDatum;

/// Latest oracle price and the UTxO it was read from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OracleQuote {
    pub price: i64,
    pub generated_at: i64,
    pub expiry: i64,
    #[serde(skip)]
    pub source_utxo: Utxo,
}

impl OracleQuote {
    pub fn from_utxo(utxo: Utxo) -> std::result::Result<Self, LocatorError> {
        let cbor = match &utxo.output.datum {
            Some(Datum::Inline(cbor)) => cbor,
            Some(Datum::Hash(hash)) => {
                return Err(LocatorError::DatumDecode {
                    reason: format!("feed UTxO {} carries only datum hash {}", utxo.input, hash),
                })
            }
            None => {
                return Err(LocatorError::DatumDecode {
                    reason: format!("feed UTxO {} has no datum", utxo.input),
                })
            }
        };
        let datum = OraclePriceDatum::from_cbor_hex(cbor)?;
        Ok(Self {
            price: datum.price,
            generated_at: datum.generated_at,
            expiry: datum.expiry,
            source_utxo: utxo,
        })
    }

    /// Whether the feed's advertised expiry is at or before `now_ms`.
    ///
    /// Informational only; trades are not refused on a stale feed.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expiry <= now_ms
    }
}

/// Locate the feed UTxO by its NFT and decode the price datum.
pub async fn get_oracle_quote(
    provider: &dyn LedgerProvider,
    oracle_address: &Address,
    oracle_nft: &AssetClass,
) -> Result<OracleQuote> {
    let utxos = provider.get_utxos(oracle_address).await?;
    let feed = select_unique(&utxos, oracle_nft).map_err(|e| LocatorError::OracleNotFound {
        address: oracle_address.to_string(),
        matches: e.matches(),
    })?;

    let quote = OracleQuote::from_utxo(feed.clone())?;
    tracing::debug!(
        utxo = %quote.source_utxo.input,
        price = quote.price,
        expiry = quote.expiry,
        "Oracle feed read"
    );
    Ok(quote)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::datum::tests::FEED_DATUM;
    use ledger_client::testing::MemoryLedger;
    use swap_core::Error;
    use swap_tx::{OutputRef, TxOutput, Value};

    pub(crate) fn oracle_address() -> Address {
        Address::new("addr_test1wz0zu8eqv3a9vm3ytqq9m6nwr6pr2avz85f5d6yayme3l6cqhafe0")
    }

    pub(crate) fn oracle_nft() -> AssetClass {
        AssetClass::from_utf8_name(
            "8fe2ef24b3cc8882f01d9246479ef6c6fc24a6950b222c206907a8be",
            "OracleFeed",
        )
    }

    pub(crate) fn feed_utxo(tx: &str, datum: Option<Datum>) -> Utxo {
        let value = Value::lovelace(2_500_000)
            .with_asset(&oracle_nft(), 1)
            .unwrap();
        let mut output = TxOutput::new(oracle_address(), value);
        output.datum = datum;
        Utxo::new(OutputRef::new(tx, 0), output)
    }

    #[tokio::test]
    async fn test_get_oracle_quote() {
        let ledger = MemoryLedger::new();
        ledger.add_utxo(feed_utxo("feed", Some(Datum::Inline(FEED_DATUM.into()))));
        // An unrelated UTxO at the same address is ignored
        ledger.add_utxo(Utxo::new(
            OutputRef::new("noise", 0),
            TxOutput::new(oracle_address(), Value::lovelace(1_000_000)),
        ));

        let quote = get_oracle_quote(&ledger, &oracle_address(), &oracle_nft())
            .await
            .unwrap();
        assert_eq!(quote.price, 2_000_000);
        assert_eq!(quote.source_utxo.input, OutputRef::new("feed", 0));
        assert!(!quote.is_expired(1_700_000_000_000));
        assert!(quote.is_expired(1_700_000_600_000));

        // Reading twice yields the same quote
        let again = get_oracle_quote(&ledger, &oracle_address(), &oracle_nft())
            .await
            .unwrap();
        assert_eq!(quote, again);
    }

    #[tokio::test]
    async fn test_oracle_not_found() {
        let ledger = MemoryLedger::new();
        match get_oracle_quote(&ledger, &oracle_address(), &oracle_nft()).await {
            Err(Error::Locator(LocatorError::OracleNotFound { matches, .. })) => {
                assert_eq!(matches, 0)
            }
            other => panic!("Wrong result: {:?}", other),
        }

        ledger.add_utxo(feed_utxo("a", Some(Datum::Inline(FEED_DATUM.into()))));
        ledger.add_utxo(feed_utxo("b", Some(Datum::Inline(FEED_DATUM.into()))));
        match get_oracle_quote(&ledger, &oracle_address(), &oracle_nft()).await {
            Err(Error::Locator(LocatorError::OracleNotFound { matches, .. })) => {
                assert_eq!(matches, 2)
            }
            other => panic!("Wrong result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_oracle_datum_errors() {
        for datum in [
            None,
            Some(Datum::Hash("923918e4".into())),
            Some(Datum::Inline("d87980".into())),
        ] {
            let ledger = MemoryLedger::new();
            ledger.add_utxo(feed_utxo("feed", datum));
            assert!(matches!(
                get_oracle_quote(&ledger, &oracle_address(), &oracle_nft()).await,
                Err(Error::Locator(LocatorError::DatumDecode { .. }))
            ));
        }
    }
}
