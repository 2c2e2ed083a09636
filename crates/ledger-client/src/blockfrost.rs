//! Blockfrost indexer backend

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use swap_core::{Address, AssetClass, ProviderError, TxId};
use swap_tx::{Datum, OutputRef, SignedTx, TxOutput, Utxo, Value};

use crate::{classify_rejection, http_client, timed_request, transport_error, LedgerProvider, Result};

/// Blockfrost returns at most this many items per page
const PAGE_SIZE: usize = 100;

/// Hard stop on pagination
const MAX_PAGES: usize = 50;

/// UTxO entry from `/addresses/{address}/utxos`
#[derive(Debug, Deserialize)]
struct BfUtxo {
    address: String,
    tx_hash: String,
    output_index: u32,
    amount: Vec<BfAmount>,
    #[serde(default)]
    data_hash: Option<String>,
    #[serde(default)]
    inline_datum: Option<String>,
    #[serde(default)]
    reference_script_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BfAmount {
    unit: String,
    quantity: String,
}

/// Error body Blockfrost sends with non-2xx responses
#[derive(Debug, Deserialize)]
struct BfError {
    #[serde(default)]
    message: String,
}

pub struct BlockfrostProvider {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
}

impl BlockfrostProvider {
    pub fn new(base_url: impl Into<String>, project_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .header("project_id", &self.project_id)
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
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: Some(status.as_u16()),
                message: error_message(&body),
            });
        }
        resp.json::<T>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    async fn utxo_page(&self, address: &Address, page: usize) -> Result<Vec<BfUtxo>> {
        let path = format!("/addresses/{}/utxos?page={}", address, page);
        match timed_request(self.get_json::<Vec<BfUtxo>>(&path)).await {
            // Blockfrost 404s addresses that have never been used
            Err(ProviderError::NotFound { .. }) => Ok(vec![]),
            other => other,
        }
    }

    async fn post_tx(&self, tx: &SignedTx) -> Result<TxId> {
        let bytes = tx
            .to_bytes()
            .map_err(|e| ProviderError::ParseError(format!("Invalid tx CBOR hex: {}", e)))?;
        let url = format!("{}/tx/submit", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("project_id", &self.project_id)
            .header(reqwest::header::CONTENT_TYPE, "application/cbor")
            .body(bytes)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = resp.status();
        if status == StatusCode::BAD_REQUEST {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_rejection(error_message(&body)));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: Some(status.as_u16()),
                message: error_message(&body),
            });
        }
        let id: String = resp
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        Ok(TxId::new(id))
    }
}

#[async_trait]
impl LedgerProvider for BlockfrostProvider {
    fn name(&self) -> &'static str {
        "blockfrost"
    }

    async fn get_utxos(&self, address: &Address) -> Result<Vec<Utxo>> {
        let mut utxos = Vec::new();
        for page in 1..=MAX_PAGES {
            let batch = self.utxo_page(address, page).await?;
            let last = batch.len() < PAGE_SIZE;
            for raw in batch {
                utxos.push(bf_utxo_to_utxo(raw)?);
            }
            if last {
                return Ok(utxos);
            }
        }
        tracing::warn!(
            address = %address,
            count = utxos.len(),
            "UTxO pagination limit reached, result may be incomplete"
        );
        Ok(utxos)
    }

    async fn submit(&self, tx: &SignedTx) -> Result<TxId> {
        timed_request(self.post_tx(tx)).await
    }

    async fn is_confirmed(&self, tx_id: &TxId) -> Result<bool> {
        // Only transactions included in a block are indexed under /txs
        let path = format!("/txs/{}", tx_id);
        timed_request(self.get_json::<serde_json::Value>(&path))
            .await
            .map(|_| true)
    }
}

/// Convert a Blockfrost UTxO entry into the shared UTxO type
fn bf_utxo_to_utxo(raw: BfUtxo) -> Result<Utxo> {
    let mut value = Value::default();
    for amount in &raw.amount {
        let quantity: u64 = amount.quantity.parse().map_err(|_| {
            ProviderError::ParseError(format!(
                "Invalid quantity '{}' for {}",
                amount.quantity, amount.unit
            ))
        })?;
        if amount.unit == "lovelace" {
            value.coin = quantity;
            continue;
        }
        let asset = AssetClass::from_unit(&amount.unit)
            .ok_or_else(|| ProviderError::ParseError(format!("Invalid unit: {}", amount.unit)))?;
        value
            .multi_asset
            .add_asset(&asset, quantity)
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
    }

    let datum = match (raw.inline_datum, raw.data_hash) {
        (Some(cbor), _) => Some(Datum::Inline(cbor)),
        (None, Some(hash)) => Some(Datum::Hash(hash)),
        (None, None) => None,
    };

    Ok(Utxo::new(
        OutputRef::new(raw.tx_hash, raw.output_index),
        TxOutput {
            address: Address::new(raw.address),
            value,
            datum,
            script_ref: raw.reference_script_hash,
        },
    ))
}

/// Pull the human-readable message out of a Blockfrost error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<BfError>(body)
        .ok()
        .map(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string())
}
