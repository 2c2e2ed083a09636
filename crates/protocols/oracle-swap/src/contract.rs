//! Swap contract facade
//!
//! Ties the locators, the pricer, the assembler and the submission pipeline
//! together behind one type the CLI talks to. Nothing is cached between
//! calls: every operation re-reads the oracle, the pool and the wallet.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use swap_core::{
    Address, AppConfig, AssetClass, ContractsConfig, Error, OdvConfig, PricingError, Result,
    SwapParams,
};
use swap_tx::{total_asset, total_coin, PlutusScript, Utxo};

use ledger_client::{LedgerProvider, Signer, Sleeper, SubmissionOutcome, SubmissionPipeline};

use crate::balance;
use crate::calculator::{display_price, native_to_quote, quote_to_native, to_lovelace};
use crate::collateral::ensure_collateral;
use crate::odv::get_aggstate_settings;
use crate::oracle::{get_oracle_quote, OracleQuote};
use crate::pool::get_pool_utxo;
use crate::state::{PoolState, PoolUtxo, TradeDirection, TradePlan};
use crate::tx_builder::{
    build_add_liquidity_tx, build_odv_request_tx, build_start_swap_tx, build_swap_tx,
    StartSwapRequest, SwapTxContext,
};

/// Wallet balances relevant to the swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserLiquidity {
    pub lovelace: u64,
    pub quote: u64,
}

/// Oracle quote plus its human-readable price
#[derive(Debug, Clone, Serialize)]
pub struct OracleFeed {
    #[serde(flatten)]
    pub quote: OracleQuote,
    /// Native coin per quote unit
    pub display_price: f64,
    pub expired: bool,
}

#[derive(Debug, Clone)]
pub struct TradeOutcome {
    pub plan: TradePlan,
    pub submission: SubmissionOutcome,
}

#[derive(Debug, Clone)]
pub struct OdvRequestOutcome {
    /// Payment-token units sent
    pub funds: u64,
    /// What the current fee schedule asks for
    pub recommended: u64,
    pub submission: SubmissionOutcome,
}

pub struct SwapContract {
    contracts: ContractsConfig,
    wallet: Address,
    params: SwapParams,
    pipeline: SubmissionPipeline,
}

impl SwapContract {
    pub fn new(
        config: &AppConfig,
        provider: Arc<dyn LedgerProvider>,
        signer: Arc<dyn Signer>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            contracts: config.contracts.clone(),
            wallet: config.wallet.address.clone(),
            params: config.swap.clone(),
            pipeline: SubmissionPipeline::new(
                provider,
                signer,
                sleeper,
                config.submission.clone(),
            ),
        }
    }

    pub fn oracle_address(&self) -> &Address {
        &self.contracts.oracle_address
    }

    pub fn swap_address(&self) -> &Address {
        &self.contracts.swap_address
    }

    pub fn wallet_address(&self) -> &Address {
        &self.wallet
    }

    fn provider(&self) -> &dyn LedgerProvider {
        self.pipeline.provider().as_ref()
    }

    fn tx_context(&self) -> SwapTxContext {
        SwapTxContext {
            wallet: self.wallet.clone(),
            swap_address: self.contracts.swap_address.clone(),
            swap_script: PlutusScript::v2(self.contracts.swap_script_cbor.clone()),
            pool_nft: self.contracts.pool_nft.clone(),
            ttl_offset: self.pipeline.config().ttl_offset,
        }
    }

    // =========================================================================
    // Reports
    // =========================================================================

    pub async fn oracle_feed(&self) -> Result<OracleFeed> {
        let quote = self.read_oracle().await?;
        Ok(OracleFeed {
            display_price: display_price(quote.price, self.params.coin_precision),
            expired: quote.is_expired(now_ms()),
            quote,
        })
    }

    pub async fn pool_liquidity(&self) -> Result<PoolState> {
        Ok(self.read_pool().await?.state)
    }

    pub async fn user_liquidity(&self, address: &Address) -> Result<UserLiquidity> {
        let utxos = self.provider().get_utxos(address).await?;
        Ok(UserLiquidity {
            lovelace: total_coin(&utxos),
            quote: total_asset(&utxos, &self.contracts.quote_asset),
        })
    }

    // =========================================================================
    // Trades
    // =========================================================================

    /// Price a trade against the current oracle and pool without submitting.
    pub async fn preview_trade(&self, direction: TradeDirection, amount: u64) -> Result<TradePlan> {
        let (plan, _, _) = self.price_trade(direction, amount).await?;
        Ok(plan)
    }

    /// Price, assemble, sign and submit a trade.
    pub async fn trade(&self, direction: TradeDirection, amount: u64) -> Result<TradeOutcome> {
        let (plan, pool, oracle) = self.price_trade(direction, amount).await?;

        let collateral = self.collateral().await?;
        let tx = build_swap_tx(&self.tx_context(), &pool, &oracle.source_utxo, &plan, &collateral)?;

        tracing::info!(
            direction = direction.as_str(),
            amount_in = plan.amount_in,
            amount_out = plan.amount_out,
            price = plan.price,
            "Submitting trade"
        );
        let submission = self.pipeline.submit_and_confirm(tx).await;
        log_outcome("trade", &submission);
        Ok(TradeOutcome { plan, submission })
    }

    async fn price_trade(
        &self,
        direction: TradeDirection,
        amount: u64,
    ) -> Result<(TradePlan, PoolUtxo, OracleQuote)> {
        let oracle = self.read_oracle().await?;
        let pool = self.read_pool().await?;
        let plan = plan_trade(
            direction,
            amount,
            oracle.price,
            &pool,
            &self.contracts.quote_asset,
            &self.params,
        )?;

        let wallet_utxos = self.provider().get_utxos(&self.wallet).await?;
        check_user_funds(
            &plan,
            &wallet_utxos,
            &self.contracts.quote_asset,
            self.params.coin_precision,
        )?;
        Ok((plan, pool, oracle))
    }

    // =========================================================================
    // Pool administration
    // =========================================================================

    /// Deposit `amount_quote` quote units and `amount_native` whole coins.
    pub async fn add_liquidity(
        &self,
        amount_quote: u64,
        amount_native: u64,
    ) -> Result<SubmissionOutcome> {
        if amount_quote == 0 && amount_native == 0 {
            return Err(PricingError::InvalidAmount {
                message: "nothing to deposit".to_string(),
            }
            .into());
        }
        let lovelace = to_lovelace(amount_native, self.params.coin_precision)?;

        let pool = self.read_pool().await?;
        let wallet_utxos = self.provider().get_utxos(&self.wallet).await?;
        require_funds(
            &self.contracts.quote_asset.display_name(),
            amount_quote,
            total_asset(&wallet_utxos, &self.contracts.quote_asset),
        )?;
        require_funds("lovelace", lovelace, total_coin(&wallet_utxos))?;

        let pool_value = balance::apply(
            pool.utxo.value(),
            &self.contracts.quote_asset,
            i128::from(amount_quote),
            i128::from(lovelace),
        )?;

        let collateral = self.collateral().await?;
        let tx = build_add_liquidity_tx(&self.tx_context(), &pool, pool_value, &collateral)?;

        tracing::info!(amount_quote, amount_native, "Submitting liquidity deposit");
        let outcome = self.pipeline.submit_and_confirm(tx).await;
        log_outcome("add_liquidity", &outcome);
        Ok(outcome)
    }

    /// Mint the pool NFT and lock it at the swap address.
    pub async fn start_swap(&self) -> Result<SubmissionOutcome> {
        let mint_script = self
            .contracts
            .mint_script_cbor
            .clone()
            .ok_or_else(|| Error::Config("contracts.mint_script_cbor is not set".to_string()))?;

        let request = StartSwapRequest {
            mint_script: PlutusScript::v2(mint_script),
            nft: AssetClass::from_utf8_name(
                self.contracts.pool_nft.policy_id.as_str(),
                &self.contracts.swap_nft_name,
            ),
            min_utxo_lovelace: self.params.min_utxo_lovelace,
        };

        let collateral = self.collateral().await?;
        let tx = build_start_swap_tx(&self.tx_context(), &request, &collateral)?;

        tracing::info!(nft = %request.nft, "Submitting pool NFT mint");
        let outcome = self.pipeline.submit_and_confirm(tx).await;
        log_outcome("start_swap", &outcome);
        Ok(outcome)
    }

    // =========================================================================
    // Oracle requests
    // =========================================================================

    /// Payment-token amount that covers one aggregation round right now.
    pub async fn recommended_odv_funds(&self) -> Result<u64> {
        let odv = self.odv_config()?;
        let settings = get_aggstate_settings(
            self.provider(),
            &self.contracts.oracle_address,
            &odv.aggstate_nft,
        )
        .await?;

        let rate = match &odv.rate_oracle {
            Some(rate_oracle) => Some(
                get_oracle_quote(self.provider(), &rate_oracle.address, &rate_oracle.nft)
                    .await?
                    .price,
            ),
            None => None,
        };
        Ok(settings.recommended_funds(rate, self.params.coin_precision)?)
    }

    /// Prepay the oracle for an on-demand feed update.
    ///
    /// Sends `funds` payment-token units, or the recommended amount when
    /// `None`. Paying less than recommended is allowed but logged.
    pub async fn send_odv_request(&self, funds: Option<u64>) -> Result<OdvRequestOutcome> {
        let odv = self.odv_config()?;
        let recommended = self.recommended_odv_funds().await?;
        let funds = funds.unwrap_or(recommended);
        if funds < recommended {
            tracing::warn!(funds, recommended, "ODV payment is below the recommended amount");
        }

        let wallet_utxos = self.provider().get_utxos(&self.wallet).await?;
        require_funds(
            &odv.payment_token.display_name(),
            funds,
            total_asset(&wallet_utxos, &odv.payment_token),
        )?;

        let tx = build_odv_request_tx(
            &self.tx_context(),
            &self.contracts.oracle_address,
            &odv.payment_token,
            funds,
            self.params.min_utxo_lovelace,
        )?;

        tracing::info!(funds, recommended, "Submitting ODV request");
        let submission = self.pipeline.submit_and_confirm(tx).await;
        log_outcome("send_odv_request", &submission);
        Ok(OdvRequestOutcome {
            funds,
            recommended,
            submission,
        })
    }

    fn odv_config(&self) -> Result<&OdvConfig> {
        self.contracts
            .odv
            .as_ref()
            .ok_or_else(|| Error::Config("contracts.odv is not set".to_string()))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn read_oracle(&self) -> Result<OracleQuote> {
        let quote = get_oracle_quote(
            self.provider(),
            &self.contracts.oracle_address,
            &self.contracts.oracle_nft,
        )
        .await?;
        if quote.is_expired(now_ms()) {
            tracing::warn!(expiry = quote.expiry, "Oracle feed is past its expiry");
        }
        Ok(quote)
    }

    async fn read_pool(&self) -> Result<PoolUtxo> {
        get_pool_utxo(
            self.provider(),
            &self.contracts.swap_address,
            &self.contracts.pool_nft,
            &self.contracts.quote_asset,
        )
        .await
    }

    async fn collateral(&self) -> Result<Utxo> {
        ensure_collateral(
            &self.pipeline,
            &self.wallet,
            self.params.collateral_amount,
            self.params.collateral_tolerance,
        )
        .await
    }
}

/// Price a trade against `pool` at `price`. Pure.
pub fn plan_trade(
    direction: TradeDirection,
    amount: u64,
    price: i64,
    pool: &PoolUtxo,
    quote_asset: &AssetClass,
    params: &SwapParams,
) -> std::result::Result<TradePlan, PricingError> {
    let precision = params.coin_precision;
    let (amount_out, pool_value, user_value) = match direction {
        TradeDirection::SwapA => {
            let native_out = quote_to_native(amount, price, precision)?;
            let lovelace_out = to_lovelace(native_out, precision)?;
            let pool_value = balance::apply(
                pool.utxo.value(),
                quote_asset,
                i128::from(amount),
                -i128::from(lovelace_out),
            )?;
            (native_out, pool_value, balance::swap_a_user_value(lovelace_out))
        }
        TradeDirection::SwapB => {
            let quote_out = native_to_quote(amount, price, precision)?;
            let lovelace_in = to_lovelace(amount, precision)?;
            let pool_value = balance::apply(
                pool.utxo.value(),
                quote_asset,
                -i128::from(quote_out),
                i128::from(lovelace_in),
            )?;
            let user_value =
                balance::swap_b_user_value(quote_asset, quote_out, params.min_utxo_lovelace)?;
            (quote_out, pool_value, user_value)
        }
    };

    Ok(TradePlan {
        direction,
        amount_in: amount,
        amount_out,
        price,
        pool_before: pool.state,
        pool_after: PoolState::from_value(&pool_value, quote_asset),
        pool_value,
        user_value,
    })
}

/// The wallet must hold what the user is selling.
pub fn check_user_funds(
    plan: &TradePlan,
    wallet_utxos: &[Utxo],
    quote_asset: &AssetClass,
    precision: u64,
) -> std::result::Result<(), PricingError> {
    match plan.direction {
        TradeDirection::SwapA => require_funds(
            &quote_asset.display_name(),
            plan.amount_in,
            total_asset(wallet_utxos, quote_asset),
        ),
        TradeDirection::SwapB => require_funds(
            "lovelace",
            to_lovelace(plan.amount_in, precision)?,
            total_coin(wallet_utxos),
        ),
    }
}

fn require_funds(asset: &str, required: u64, available: u64) -> std::result::Result<(), PricingError> {
    if available < required {
        return Err(PricingError::InsufficientUserFunds {
            asset: asset.to_string(),
            required,
            available,
        });
    }
    Ok(())
}

fn log_outcome(operation: &str, outcome: &SubmissionOutcome) {
    let tx_id = outcome.tx_id().map(|id| id.as_str()).unwrap_or("-");
    if outcome.status.is_success() {
        tracing::info!(operation, tx_id, attempts = outcome.attempts, "Transaction confirmed");
    } else {
        tracing::warn!(
            operation,
            tx_id,
            status = outcome.status.as_str(),
            "Transaction did not confirm"
        );
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
