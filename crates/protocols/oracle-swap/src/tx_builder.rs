//! Oracle Swap Transaction Builder
//!
//! Builds unsigned transaction plans for trades, liquidity top-ups, the
//! initial pool mint and oracle ODV requests.
//!
//! # Important Notes
//!
//! - The pool UTxO is always the first (and only) script input
//! - The recreated pool output carries the unit datum `Constr 0 []`
//! - Trades read the oracle feed as a reference input; it is never spent
//! - Collateral must be pure coin

use swap_core::constants::UNIT_DATUM_CBOR;
use swap_core::{Address, AssemblyError, AssetClass, Lovelace};
use swap_tx::{
    MintAction, MintEntry, MultiAsset, PlutusScript, Redeemer, TxOutput, UnsignedTx, Utxo, Value,
};

use crate::odv::{ODV_METADATA_LABEL, ODV_REQUEST_TAG};
use crate::state::{mint_token_redeemer, PoolUtxo, SwapRedeemer, TradePlan};

/// CIP-25 metadata label
pub const NFT_METADATA_LABEL: &str = "721";

/// Execution budget attached to the mint redeemer
const MINT_EX_UNITS_MEM: u64 = 1_000_000;
const MINT_EX_UNITS_STEPS: u64 = 300_979_640;

/// Everything the assembler needs besides the UTxOs themselves
#[derive(Debug, Clone)]
pub struct SwapTxContext {
    pub wallet: Address,
    pub swap_address: Address,
    pub swap_script: PlutusScript,
    pub pool_nft: AssetClass,
    pub ttl_offset: u64,
}

/// Build the plan for a priced trade.
///
/// Assembly order: pool script input, wallet balancing address, user output,
/// recreated pool output, oracle reference input, collateral.
pub fn build_swap_tx(
    ctx: &SwapTxContext,
    pool: &PoolUtxo,
    oracle_utxo: &Utxo,
    plan: &TradePlan,
    collateral: &Utxo,
) -> Result<UnsignedTx, AssemblyError> {
    check_pool(ctx, pool, &plan.pool_value)?;
    check_collateral(collateral)?;

    let redeemer = SwapRedeemer::for_trade(plan.direction, plan.amount_in);

    let mut tx = UnsignedTx::new(ctx.wallet.clone(), ctx.ttl_offset);
    tx.add_script_input(
        pool.utxo.clone(),
        ctx.swap_script.clone(),
        Redeemer::spend(redeemer.to_data()),
    );
    tx.add_input_address(ctx.wallet.clone());
    tx.add_output(TxOutput::new(ctx.wallet.clone(), plan.user_value.clone()));
    tx.add_output(pool_output(ctx, plan.pool_value.clone()));
    tx.add_reference_input(oracle_utxo.clone());
    tx.add_collateral(collateral.clone());
    Ok(tx)
}

/// Build the plan that tops up the pool to `pool_value`.
///
/// No oracle reference; the only output is the recreated pool.
pub fn build_add_liquidity_tx(
    ctx: &SwapTxContext,
    pool: &PoolUtxo,
    pool_value: Value,
    collateral: &Utxo,
) -> Result<UnsignedTx, AssemblyError> {
    check_pool(ctx, pool, &pool_value)?;
    check_collateral(collateral)?;

    let mut tx = UnsignedTx::new(ctx.wallet.clone(), ctx.ttl_offset);
    tx.add_script_input(
        pool.utxo.clone(),
        ctx.swap_script.clone(),
        Redeemer::spend(SwapRedeemer::AddLiquidity.to_data()),
    );
    tx.add_input_address(ctx.wallet.clone());
    tx.add_output(pool_output(ctx, pool_value));
    tx.add_collateral(collateral.clone());
    Ok(tx)
}

/// Request to mint the pool NFT and lock it at the swap address
#[derive(Debug, Clone)]
pub struct StartSwapRequest {
    pub mint_script: PlutusScript,
    /// Asset minted; its policy must be the hash of `mint_script`
    pub nft: AssetClass,
    pub min_utxo_lovelace: Lovelace,
}

pub fn build_start_swap_tx(
    ctx: &SwapTxContext,
    request: &StartSwapRequest,
    collateral: &Utxo,
) -> Result<UnsignedTx, AssemblyError> {
    check_collateral(collateral)?;

    let value = Value {
        coin: request.min_utxo_lovelace,
        multi_asset: MultiAsset::from_asset(&request.nft, 1),
    };

    let mut tx = UnsignedTx::new(ctx.wallet.clone(), ctx.ttl_offset);
    tx.add_input_address(ctx.wallet.clone());
    tx.mint = Some(MintAction {
        policy_script: request.mint_script.clone(),
        assets: vec![MintEntry {
            asset_name: request.nft.asset_name.clone(),
            quantity: 1,
        }],
        redeemer: Redeemer::mint(mint_token_redeemer())
            .with_ex_units(MINT_EX_UNITS_MEM, MINT_EX_UNITS_STEPS),
    });
    tx.metadata = Some(nft_metadata(&request.nft));
    tx.add_output(pool_output(ctx, value));
    tx.add_collateral(collateral.clone());
    Ok(tx)
}

/// Payment of `funds` payment-token units to the oracle's aggregation-state
/// address, tagged with the ODV request metadata.
///
/// Plain wallet spend: no script input, so no collateral.
pub fn build_odv_request_tx(
    ctx: &SwapTxContext,
    oracle_address: &Address,
    payment_token: &AssetClass,
    funds: u64,
    min_utxo_lovelace: Lovelace,
) -> Result<UnsignedTx, AssemblyError> {
    if funds == 0 {
        return Err(AssemblyError::BuildFailed {
            message: "an ODV request must carry a positive payment".to_string(),
        });
    }
    let value = Value::lovelace(min_utxo_lovelace)
        .with_asset(payment_token, funds)
        .map_err(|e| AssemblyError::BuildFailed {
            message: e.to_string(),
        })?;

    let mut tx = UnsignedTx::new(ctx.wallet.clone(), ctx.ttl_offset);
    tx.add_input_address(ctx.wallet.clone());
    tx.add_output(TxOutput::new(oracle_address.clone(), value));
    tx.metadata = Some(serde_json::json!({ ODV_METADATA_LABEL: ODV_REQUEST_TAG }));
    Ok(tx)
}

fn pool_output(ctx: &SwapTxContext, value: Value) -> TxOutput {
    TxOutput::new(ctx.swap_address.clone(), value).with_inline_datum(UNIT_DATUM_CBOR)
}

fn check_pool(ctx: &SwapTxContext, pool: &PoolUtxo, next: &Value) -> Result<(), AssemblyError> {
    let nft = MultiAsset::from_asset(&ctx.pool_nft, 1);
    if !pool.utxo.contains(&nft) || !next.multi_asset.contains(&nft) {
        return Err(AssemblyError::MissingPoolNft {
            utxo: pool.utxo.input.to_string(),
        });
    }
    Ok(())
}

fn check_collateral(collateral: &Utxo) -> Result<(), AssemblyError> {
    if !collateral.value().is_pure_coin() {
        return Err(AssemblyError::CollateralNotPureCoin {
            utxo: collateral.input.to_string(),
        });
    }
    Ok(())
}

fn nft_metadata(nft: &AssetClass) -> serde_json::Value {
    let name = nft.display_name();
    serde_json::json!({
        NFT_METADATA_LABEL: {
            nft.policy_id.as_str(): {
                name.as_str(): {
                    "name": name,
                    "description": "Oracle swap pool identifier",
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::tests::{pool_nft, pool_utxo, quote_asset, swap_address};
    use crate::state::{PoolState, TradeDirection};
    use swap_tx::{OutputRef, RedeemerData, RedeemerPurpose};

    fn ctx() -> SwapTxContext {
        SwapTxContext {
            wallet: Address::new("addr_test1vr2jvlvw62kv82x8gn0pewn6n5r82m6zxxn6c7vp04t9avs3wgpxv"),
            swap_address: swap_address(),
            swap_script: PlutusScript::v2("59010101000032"),
            pool_nft: pool_nft(),
            ttl_offset: 120,
        }
    }

    fn pool() -> PoolUtxo {
        let utxo = pool_utxo("pool", 50_000_000, 100);
        let state = PoolState::from_value(utxo.value(), &quote_asset());
        PoolUtxo { utxo, state }
    }

    fn oracle() -> Utxo {
        Utxo::new(
            OutputRef::new("feed", 0),
            TxOutput::new(Address::new("addr_test1woracle"), Value::lovelace(2_000_000)),
        )
    }

    fn collateral() -> Utxo {
        Utxo::new(
            OutputRef::new("coll", 0),
            TxOutput::new(ctx().wallet, Value::lovelace(5_000_000)),
        )
    }

    fn swap_b_plan() -> TradePlan {
        let pool_value = Value::lovelace(55_000_000)
            .with_asset(&pool_nft(), 1)
            .unwrap()
            .with_asset(&quote_asset(), 98)
            .unwrap();
        TradePlan {
            direction: TradeDirection::SwapB,
            amount_in: 5,
            amount_out: 2,
            price: 2_000_000,
            pool_before: pool().state,
            pool_after: PoolState::from_value(&pool_value, &quote_asset()),
            pool_value,
            user_value: Value::lovelace(2_000_000)
                .with_asset(&quote_asset(), 2)
                .unwrap(),
        }
    }

    #[test]
    fn test_build_swap_tx_order() {
        let plan = swap_b_plan();
        let tx = build_swap_tx(&ctx(), &pool(), &oracle(), &plan, &collateral()).unwrap();

        assert_eq!(tx.script_inputs.len(), 1);
        let script_input = &tx.script_inputs[0];
        assert_eq!(script_input.utxo.input, OutputRef::new("pool", 0));
        assert_eq!(script_input.redeemer.purpose, RedeemerPurpose::Spend);
        assert_eq!(script_input.redeemer.data, RedeemerData::new(1, vec![5]));

        assert_eq!(tx.input_addresses, vec![ctx().wallet]);
        assert_eq!(tx.outputs.len(), 2);
        assert_eq!(tx.outputs[0].address, ctx().wallet);
        assert_eq!(tx.outputs[0].value, plan.user_value);
        assert_eq!(tx.outputs[1].address, swap_address());
        assert_eq!(tx.outputs[1].value, plan.pool_value);
        assert_eq!(tx.outputs[1].inline_datum(), Some(UNIT_DATUM_CBOR));

        assert_eq!(tx.reference_inputs, vec![oracle()]);
        assert_eq!(tx.collateral, vec![collateral()]);
        assert_eq!(tx.change_address, ctx().wallet);
        assert_eq!(tx.ttl_offset, 120);
        assert!(tx.mint.is_none());
    }

    #[test]
    fn test_build_swap_tx_rejects_token_collateral() {
        let mut bad = collateral();
        bad.output.value = bad.output.value.with_asset(&quote_asset(), 1).unwrap();
        assert!(matches!(
            build_swap_tx(&ctx(), &pool(), &oracle(), &swap_b_plan(), &bad),
            Err(AssemblyError::CollateralNotPureCoin { .. })
        ));
    }

    #[test]
    fn test_build_swap_tx_requires_pool_nft() {
        let mut stray = pool();
        stray.utxo.output.value.multi_asset.set(&pool_nft(), 0);
        assert!(matches!(
            build_swap_tx(&ctx(), &stray, &oracle(), &swap_b_plan(), &collateral()),
            Err(AssemblyError::MissingPoolNft { .. })
        ));
    }

    #[test]
    fn test_build_add_liquidity_tx() {
        let next = pool()
            .utxo
            .value()
            .checked_add(&Value::lovelace(3_000_000).with_asset(&quote_asset(), 10).unwrap())
            .unwrap();
        let tx = build_add_liquidity_tx(&ctx(), &pool(), next.clone(), &collateral()).unwrap();

        assert_eq!(tx.script_inputs[0].redeemer.data, RedeemerData::unit(2));
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].value, next);
        assert!(tx.reference_inputs.is_empty());
    }

    #[test]
    fn test_build_start_swap_tx() {
        let request = StartSwapRequest {
            mint_script: PlutusScript::v2("4e4d01000033222220051200120011"),
            nft: pool_nft(),
            min_utxo_lovelace: 2_000_000,
        };
        let tx = build_start_swap_tx(&ctx(), &request, &collateral()).unwrap();

        assert!(tx.script_inputs.is_empty());
        let mint = tx.mint.as_ref().unwrap();
        assert_eq!(mint.assets, vec![MintEntry { asset_name: "5357415033".into(), quantity: 1 }]);
        assert_eq!(mint.redeemer.purpose, RedeemerPurpose::Mint);
        assert_eq!(mint.redeemer.data, RedeemerData::unit(0));
        assert!(mint.redeemer.ex_units.is_some());

        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].address, swap_address());
        assert_eq!(tx.outputs[0].value.coin, 2_000_000);
        assert_eq!(tx.outputs[0].value.multi_asset.get(&pool_nft()), 1);
        assert!(tx.requires_collateral());

        let meta = tx.metadata.unwrap();
        assert_eq!(
            meta["721"]["ce8822885d18e7d304ef0248af49359d687a94f0e3635eea14c6154e"]["SWAP3"]["name"],
            "SWAP3"
        );
    }

    #[test]
    fn test_build_odv_request_tx() {
        let token = crate::odv::tests::payment_token();
        let oracle = Address::new("addr_test1woracle");
        let tx = build_odv_request_tx(&ctx(), &oracle, &token, 8_000_000, 2_000_000).unwrap();

        assert!(tx.script_inputs.is_empty());
        assert!(tx.collateral.is_empty());
        assert!(!tx.requires_collateral());
        assert_eq!(tx.input_addresses, vec![ctx().wallet]);
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].address, oracle);
        assert_eq!(tx.outputs[0].value.coin, 2_000_000);
        assert_eq!(tx.outputs[0].value.multi_asset.get(&token), 8_000_000);
        assert_eq!(tx.metadata.unwrap()["413"], "charli3-odv-oracle-request");

        assert!(matches!(
            build_odv_request_tx(&ctx(), &oracle, &token, 0, 2_000_000),
            Err(AssemblyError::BuildFailed { .. })
        ));
    }
}
