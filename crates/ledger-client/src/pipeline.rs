//! Sign, submit and confirm
//!
//! The pipeline never returns an error: every path ends in a
//! [`SubmissionOutcome`] whose status tells the caller what happened. A
//! timeout is reported separately from a definite failure because the
//! transaction may still land after we stop looking.

use std::sync::Arc;

use serde::Serialize;
use swap_core::{ProviderError, SignerError, SubmissionConfig, TxId};
use swap_tx::{SignedTx, UnsignedTx};

use crate::clock::Sleeper;
use crate::{LedgerProvider, Signer};

/// Final status of a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SubmissionStatus {
    Success,
    InsufficientFunds,
    CollateralError,
    Timeout,
    Error(String),
}

impl SubmissionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::InsufficientFunds => "insufficient_funds",
            Self::CollateralError => "collateral_error",
            Self::Timeout => "timeout",
            Self::Error(_) => "error",
        }
    }
}

/// States the pipeline passes through, recorded in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Initiated,
    Submitted,
    Confirmed,
    Retrying,
    Failed,
    GaveUp,
}

#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub status: SubmissionStatus,
    pub unsigned: UnsignedTx,
    /// Present once signing succeeded, including on timeout
    pub signed: Option<SignedTx>,
    /// Confirmation polls performed
    pub attempts: u32,
    pub trace: Vec<PipelineState>,
}

impl SubmissionOutcome {
    pub fn tx_id(&self) -> Option<&TxId> {
        self.signed.as_ref().map(|s| &s.tx_id)
    }
}

pub struct SubmissionPipeline {
    provider: Arc<dyn LedgerProvider>,
    signer: Arc<dyn Signer>,
    sleeper: Arc<dyn Sleeper>,
    config: SubmissionConfig,
}

impl SubmissionPipeline {
    pub fn new(
        provider: Arc<dyn LedgerProvider>,
        signer: Arc<dyn Signer>,
        sleeper: Arc<dyn Sleeper>,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            provider,
            signer,
            sleeper,
            config,
        }
    }

    pub fn provider(&self) -> &Arc<dyn LedgerProvider> {
        &self.provider
    }

    pub fn config(&self) -> &SubmissionConfig {
        &self.config
    }

    /// Sign `tx`, submit it, and poll until it is confirmed or we give up.
    pub async fn submit_and_confirm(&self, tx: UnsignedTx) -> SubmissionOutcome {
        let mut run = Run::new(tx);
        run.enter(PipelineState::Initiated);

        let signed = match self.signer.sign(&run.unsigned).await {
            Ok(signed) => signed,
            Err(e) => {
                tracing::warn!(error = %e, "Signing failed");
                return run.fail(signer_status(&e));
            }
        };
        run.signed = Some(signed.clone());

        let tx_id = match self.provider.submit(&signed).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(tx_id = %signed.tx_id, error = %e, "Submission rejected");
                return run.fail(submit_status(e));
            }
        };
        if tx_id != signed.tx_id {
            tracing::debug!(signer = %signed.tx_id, ledger = %tx_id, "Ledger reported a different tx id");
        }
        run.enter(PipelineState::Submitted);

        let max_attempts = self.config.max_attempts.max(1);
        let interval = self.config.poll_interval();
        // Poll straight away; sleep only between misses
        loop {
            run.attempts += 1;

            match self.provider.is_confirmed(&tx_id).await {
                Ok(true) => {
                    run.enter(PipelineState::Confirmed);
                    return run.finish(SubmissionStatus::Success);
                }
                Ok(false) | Err(ProviderError::NotFound { .. }) => {
                    tracing::debug!(
                        tx_id = %tx_id,
                        attempt = run.attempts,
                        max_attempts,
                        "Transaction not confirmed yet"
                    );
                    if run.attempts >= max_attempts {
                        break;
                    }
                    run.enter(PipelineState::Retrying);
                    self.sleeper.sleep(interval).await;
                }
                Err(e) => {
                    tracing::warn!(tx_id = %tx_id, error = %e, "Confirmation check failed");
                    return run.fail(SubmissionStatus::Error(e.to_string()));
                }
            }
        }

        tracing::warn!(tx_id = %tx_id, attempts = run.attempts, "Gave up waiting for confirmation");
        run.enter(PipelineState::GaveUp);
        run.finish(SubmissionStatus::Timeout)
    }
}

/// Mutable bookkeeping for one pipeline run
struct Run {
    unsigned: UnsignedTx,
    signed: Option<SignedTx>,
    attempts: u32,
    trace: Vec<PipelineState>,
}

impl Run {
    fn new(unsigned: UnsignedTx) -> Self {
        Self {
            unsigned,
            signed: None,
            attempts: 0,
            trace: Vec::new(),
        }
    }

    fn enter(&mut self, state: PipelineState) {
        match state {
            PipelineState::Retrying => tracing::debug!(state = ?state, "Pipeline state"),
            _ => tracing::info!(
                state = ?state,
                tx_id = self.signed.as_ref().map(|s| s.tx_id.as_str()).unwrap_or("-"),
                "Pipeline state"
            ),
        }
        self.trace.push(state);
    }

    fn fail(mut self, status: SubmissionStatus) -> SubmissionOutcome {
        self.enter(PipelineState::Failed);
        self.finish(status)
    }

    fn finish(self, status: SubmissionStatus) -> SubmissionOutcome {
        SubmissionOutcome {
            status,
            unsigned: self.unsigned,
            signed: self.signed,
            attempts: self.attempts,
            trace: self.trace,
        }
    }
}

fn signer_status(e: &SignerError) -> SubmissionStatus {
    match e {
        SignerError::InsufficientFunds { .. } | SignerError::UtxoSelection { .. } => {
            SubmissionStatus::InsufficientFunds
        }
        SignerError::Failed { message } => SubmissionStatus::Error(message.clone()),
    }
}

fn submit_status(e: ProviderError) -> SubmissionStatus {
    match e {
        ProviderError::Rejected { .. } => SubmissionStatus::CollateralError,
        ProviderError::InsufficientFunds { .. } => SubmissionStatus::InsufficientFunds,
        other => SubmissionStatus::Error(other.to_string()),
    }
}
