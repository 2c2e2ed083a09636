//! On-demand validation (ODV) requests
//!
//! An ODV request prepays the oracle's nodes in its payment token so that a
//! fresh feed gets aggregated. The fee schedule lives in the aggregation-state
//! datum at the oracle address:
//!
//! ```text
//! Constr 2 [ Constr 0 [ Constr 0 [
//!     node_list, updated_nodes, updated_node_time, aggregate_time,
//!     aggregate_change, minimum_deposit, aggregate_valid_range,
//!     Constr 0 [node_fee, aggregate_fee, platform_fee],
//!     iqr_multiplier, divergence, platform
//! ] ] ]
//! ```
//!
//! Only the node count and the three fees are read.

use pallas_primitives::PlutusData;
use serde::Serialize;
use swap_core::{Address, AssetClass, LocatorError, PricingError, Result};
use swap_tx::plutus::{as_int, decode_hex, expect_arity, expect_constr};
use swap_tx::{select_unique, Datum, PlutusError};

use ledger_client::LedgerProvider;

/// Metadata label marking an ODV request
pub const ODV_METADATA_LABEL: &str = "413";
pub const ODV_REQUEST_TAG: &str = "charli3-odv-oracle-request";

const AGG_DATUM_CONSTR: u64 = 2;
const SETTINGS_ARITY: usize = 11;
const NODE_LIST_FIELD: usize = 0;
const FEE_PRICE_FIELD: usize = 7;

/// Fee schedule of the oracle, in payment-token units before rate scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggStateSettings {
    pub node_count: u64,
    pub node_fee: u64,
    pub aggregate_fee: u64,
    pub platform_fee: u64,
}

impl AggStateSettings {
    pub fn from_cbor_hex(cbor_hex: &str) -> std::result::Result<Self, LocatorError> {
        let data = decode_hex(cbor_hex).map_err(decode_error)?;
        Self::from_plutus(&data)
    }

    pub fn from_plutus(data: &PlutusData) -> std::result::Result<Self, LocatorError> {
        let datum = expect_constr(data, AGG_DATUM_CONSTR).map_err(decode_error)?;
        expect_arity(datum, 1).map_err(decode_error)?;
        let state = expect_constr(&datum[0], 0).map_err(decode_error)?;
        expect_arity(state, 1).map_err(decode_error)?;
        let settings = expect_constr(&state[0], 0).map_err(decode_error)?;
        expect_arity(settings, SETTINGS_ARITY).map_err(decode_error)?;

        let node_count = match &settings[NODE_LIST_FIELD] {
            PlutusData::Array(nodes) => nodes.len() as u64,
            _ => return Err(shape("node list is not a list")),
        };

        let fees = expect_constr(&settings[FEE_PRICE_FIELD], 0).map_err(decode_error)?;
        expect_arity(fees, 3).map_err(decode_error)?;

        Ok(Self {
            node_count,
            node_fee: fee(&fees[0], "node_fee")?,
            aggregate_fee: fee(&fees[1], "aggregate_fee")?,
            platform_fee: fee(&fees[2], "platform_fee")?,
        })
    }

    /// Payment that covers one aggregation round.
    ///
    /// With a rate feed, each fee is first scaled by `rate / precision`
    /// (floored) before summing.
    pub fn recommended_funds(
        &self,
        rate: Option<i64>,
        precision: u64,
    ) -> std::result::Result<u64, PricingError> {
        let scale = |fee: u64| -> std::result::Result<u128, PricingError> {
            match rate {
                None => Ok(u128::from(fee)),
                Some(price) if price <= 0 => Err(PricingError::InvalidPrice { price }),
                Some(price) => Ok(u128::from(fee) * price as u128 / u128::from(precision)),
            }
        };

        let total = scale(self.aggregate_fee)?
            + scale(self.platform_fee)?
            + u128::from(self.node_count) * scale(self.node_fee)?;
        u64::try_from(total).map_err(|_| PricingError::InvalidAmount {
            message: "recommended ODV payment overflows".to_string(),
        })
    }
}

/// Locate the aggregation-state UTxO and decode its fee schedule.
pub async fn get_aggstate_settings(
    provider: &dyn LedgerProvider,
    oracle_address: &Address,
    aggstate_nft: &AssetClass,
) -> Result<AggStateSettings> {
    let utxos = provider.get_utxos(oracle_address).await?;
    let aggstate =
        select_unique(&utxos, aggstate_nft).map_err(|e| LocatorError::AggStateNotFound {
            address: oracle_address.to_string(),
            matches: e.matches(),
        })?;

    let settings = match &aggstate.output.datum {
        Some(Datum::Inline(cbor)) => AggStateSettings::from_cbor_hex(cbor)?,
        Some(Datum::Hash(_)) => {
            return Err(shape("aggregation state carries a datum hash, not an inline datum").into())
        }
        None => return Err(shape("aggregation state has no datum").into()),
    };
    tracing::debug!(
        utxo = %aggstate.input,
        nodes = settings.node_count,
        node_fee = settings.node_fee,
        "Aggregation state read"
    );
    Ok(settings)
}

fn fee(data: &PlutusData, name: &str) -> std::result::Result<u64, LocatorError> {
    as_int(data)
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(|| shape(&format!("{} is not a non-negative integer", name)))
}

fn shape(reason: &str) -> LocatorError {
    LocatorError::DatumDecode {
        reason: reason.to_string(),
    }
}

fn decode_error(e: PlutusError) -> LocatorError {
    LocatorError::DatumDecode {
        reason: e.to_string(),
    }
}
