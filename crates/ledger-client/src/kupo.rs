//! Kupo (chain index) + Ogmios (submission) backend
//!
//! Kupo answers UTxO and presence queries over its HTTP API; Ogmios accepts
//! transactions through its JSON-RPC HTTP endpoint.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use swap_core::{Address, AssetClass, ProviderError, TxId};
use swap_tx::{Datum, OutputRef, SignedTx, TxOutput, Utxo, Value};

use crate::{classify_rejection, http_client, timed_request, transport_error, LedgerProvider, Result};

/// Match entry from Kupo's `/matches` endpoint
#[derive(Debug, Deserialize)]
struct KupoMatch {
    transaction_id: String,
    output_index: u32,
    address: String,
    value: KupoValue,
    #[serde(default)]
    datum_hash: Option<String>,
    #[serde(default)]
    datum_type: Option<String>,
    #[serde(default)]
    script_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KupoValue {
    coins: u64,
    #[serde(default)]
    assets: BTreeMap<String, u64>,
}

#[derive(Debug, Deserialize)]
struct KupoDatum {
    datum: String,
}

/// Ogmios JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<SubmitResult>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct SubmitResult {
    transaction: SubmittedTx,
}

#[derive(Debug, Deserialize)]
struct SubmittedTx {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

pub struct KupoOgmiosProvider {
    client: reqwest::Client,
    kupo_url: String,
    ogmios_url: String,
}

impl KupoOgmiosProvider {
    pub fn new(kupo_url: impl Into<String>, ogmios_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            kupo_url: kupo_url.into().trim_end_matches('/').to_string(),
            ogmios_url: ogmios_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn kupo_get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.kupo_url, path);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound {
                resource: path.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::ApiError {
                status: Some(status.as_u16()),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        resp.json::<T>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    /// Resolve an inline datum that Kupo reports by hash only
    async fn resolve_datum(&self, hash: &str) -> Result<Option<String>> {
        let path = format!("/datums/{}", hash);
        let datum: Option<KupoDatum> = timed_request(self.kupo_get(&path)).await?;
        Ok(datum.map(|d| d.datum))
    }

    async fn ogmios_submit(&self, tx: &SignedTx) -> Result<TxId> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "submitTransaction",
            "params": { "transaction": { "cbor": tx.cbor_hex } },
            "id": null,
        });
        let resp = self
            .client
            .post(&self.ogmios_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&self.ogmios_url, e))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| transport_error(&self.ogmios_url, e))?;
        let rpc: RpcResponse = serde_json::from_str(&text).map_err(|_| ProviderError::ApiError {
            status: Some(status.as_u16()),
            message: text.clone(),
        })?;
        parse_submit_response(rpc)
    }
}

#[async_trait]
impl LedgerProvider for KupoOgmiosProvider {
    fn name(&self) -> &'static str {
        "kupo+ogmios"
    }

    async fn get_utxos(&self, address: &Address) -> Result<Vec<Utxo>> {
        let path = format!("/matches/{}?unspent", address);
        let matches: Vec<KupoMatch> = timed_request(self.kupo_get(&path)).await?;

        let mut utxos = Vec::with_capacity(matches.len());
        for m in matches {
            let inline = match (&m.datum_type, &m.datum_hash) {
                (Some(kind), Some(hash)) if kind == "inline" => self.resolve_datum(hash).await?,
                _ => None,
            };
            utxos.push(kupo_match_to_utxo(m, inline)?);
        }
        Ok(utxos)
    }

    async fn submit(&self, tx: &SignedTx) -> Result<TxId> {
        timed_request(self.ogmios_submit(tx)).await
    }

    async fn is_confirmed(&self, tx_id: &TxId) -> Result<bool> {
        // Kupo only indexes outputs of transactions that made it into a block
        let path = format!("/matches/*@{}", tx_id);
        let matches: Vec<serde_json::Value> = timed_request(self.kupo_get(&path)).await?;
        if matches.is_empty() {
            return Err(ProviderError::NotFound {
                resource: format!("transaction {}", tx_id),
            });
        }
        Ok(true)
    }
}

/// Convert a Kupo match (plus its resolved inline datum) into the shared UTxO type
fn kupo_match_to_utxo(m: KupoMatch, inline_datum: Option<String>) -> Result<Utxo> {
    let mut value = Value::lovelace(m.value.coins);
    for (key, quantity) in &m.value.assets {
        let asset = AssetClass::from_dotted(key)
            .ok_or_else(|| ProviderError::ParseError(format!("Invalid asset key: {}", key)))?;
        value
            .multi_asset
            .add_asset(&asset, *quantity)
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
    }

    let datum = match (inline_datum, m.datum_hash) {
        (Some(cbor), _) => Some(Datum::Inline(cbor)),
        (None, Some(hash)) => Some(Datum::Hash(hash)),
        (None, None) => None,
    };

    Ok(Utxo::new(
        OutputRef::new(m.transaction_id, m.output_index),
        TxOutput {
            address: Address::new(m.address),
            value,
            datum,
            script_ref: m.script_hash,
        },
    ))
}

fn parse_submit_response(rpc: RpcResponse) -> Result<TxId> {
    match (rpc.result, rpc.error) {
        (Some(result), _) => Ok(TxId::new(result.transaction.id)),
        (None, Some(error)) => {
            tracing::debug!(code = error.code, "Ogmios rejected transaction");
            Err(classify_rejection(error.message))
        }
        (None, None) => Err(ProviderError::ParseError(
            "Ogmios response has neither result nor error".to_string(),
        )),
    }
}
