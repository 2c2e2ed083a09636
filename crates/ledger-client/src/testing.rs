//! In-memory test doubles
//!
//! [`MemoryLedger`] is both a provider and a signer: signing records the plan
//! under a fresh tx id, and submitting that tx applies the plan to the
//! in-memory UTxO set (spent inputs removed, outputs created). Balancing
//! inputs chosen by a real signer are not modelled.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use swap_core::{Address, ProviderError, SignerError, TxId};
use swap_tx::{OutputRef, SignedTx, UnsignedTx, Utxo};

use crate::clock::Sleeper;
use crate::{LedgerProvider, Result, Signer};

fn fake_tx_id(n: u64) -> String {
    format!("{:064x}", n)
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct LedgerState {
    utxos: HashMap<Address, Vec<Utxo>>,
    plans: HashMap<TxId, UnsignedTx>,
    submitted: Vec<TxId>,
    get_utxos_calls: usize,
    confirmations: VecDeque<Result<bool>>,
    never_confirm: bool,
    submit_error: Option<ProviderError>,
    sign_error: Option<SignerError>,
    /// `get_utxos` fails once it has been called more than `.0` times
    utxos_error: Option<(usize, ProviderError)>,
}

#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
    next_tx: AtomicU64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a UTxO at its output address
    pub fn add_utxo(&self, utxo: Utxo) {
        let mut state = lock(&self.state);
        state
            .utxos
            .entry(utxo.output.address.clone())
            .or_default()
            .push(utxo);
    }

    pub fn utxos_at(&self, address: &Address) -> Vec<Utxo> {
        lock(&self.state)
            .utxos
            .get(address)
            .cloned()
            .unwrap_or_default()
    }

    /// Replies for the next `is_confirmed` calls, consumed in order
    pub fn script_confirmations(&self, replies: Vec<Result<bool>>) {
        lock(&self.state).confirmations.extend(replies);
    }

    /// Every unscripted confirmation check answers NotFound
    pub fn never_confirm(&self) {
        lock(&self.state).never_confirm = true;
    }

    pub fn fail_submit_with(&self, error: ProviderError) {
        lock(&self.state).submit_error = Some(error);
    }

    /// Let the first `calls` UTxO queries succeed, then fail every later one
    pub fn fail_get_utxos_after(&self, calls: usize, error: ProviderError) {
        lock(&self.state).utxos_error = Some((calls, error));
    }

    pub fn fail_sign_with(&self, error: SignerError) {
        lock(&self.state).sign_error = Some(error);
    }

    pub fn submitted(&self) -> Vec<TxId> {
        lock(&self.state).submitted.clone()
    }

    /// Plans that were submitted, in submission order
    pub fn submitted_plans(&self) -> Vec<UnsignedTx> {
        let state = lock(&self.state);
        state
            .submitted
            .iter()
            .filter_map(|id| state.plans.get(id).cloned())
            .collect()
    }

    pub fn get_utxos_calls(&self) -> usize {
        lock(&self.state).get_utxos_calls
    }

    fn apply(state: &mut LedgerState, tx_id: &TxId, plan: &UnsignedTx) {
        let spent: Vec<OutputRef> = plan.spent_refs().into_iter().cloned().collect();
        for utxos in state.utxos.values_mut() {
            utxos.retain(|u| !spent.contains(&u.input));
        }
        for (index, output) in plan.outputs.iter().enumerate() {
            let utxo = Utxo::new(
                OutputRef::new(tx_id.as_str(), index as u32),
                output.clone(),
            );
            state
                .utxos
                .entry(output.address.clone())
                .or_default()
                .push(utxo);
        }
    }
}

#[async_trait]
impl LedgerProvider for MemoryLedger {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_utxos(&self, address: &Address) -> Result<Vec<Utxo>> {
        let mut state = lock(&self.state);
        state.get_utxos_calls += 1;
        if let Some((allowed, error)) = &state.utxos_error {
            if state.get_utxos_calls > *allowed {
                return Err(error.clone());
            }
        }
        Ok(state.utxos.get(address).cloned().unwrap_or_default())
    }

    async fn submit(&self, tx: &SignedTx) -> Result<TxId> {
        let mut state = lock(&self.state);
        if let Some(e) = state.submit_error.clone() {
            return Err(e);
        }
        if let Some(plan) = state.plans.get(&tx.tx_id).cloned() {
            Self::apply(&mut state, &tx.tx_id, &plan);
        }
        state.submitted.push(tx.tx_id.clone());
        Ok(tx.tx_id.clone())
    }

    async fn is_confirmed(&self, tx_id: &TxId) -> Result<bool> {
        let mut state = lock(&self.state);
        if let Some(reply) = state.confirmations.pop_front() {
            return reply;
        }
        if !state.never_confirm && state.submitted.contains(tx_id) {
            return Ok(true);
        }
        Err(ProviderError::NotFound {
            resource: format!("transaction {}", tx_id),
        })
    }
}

#[async_trait]
impl Signer for MemoryLedger {
    async fn sign(&self, tx: &UnsignedTx) -> std::result::Result<SignedTx, SignerError> {
        let mut state = lock(&self.state);
        if let Some(e) = state.sign_error.clone() {
            return Err(e);
        }
        let n = self.next_tx.fetch_add(1, Ordering::SeqCst) + 1;
        let signed = SignedTx::new(fake_tx_id(n), "84a0");
        state.plans.insert(signed.tx_id.clone(), tx.clone());
        Ok(signed)
    }
}

/// Records requested sleeps instead of waiting
#[derive(Default)]
pub struct FakeSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl FakeSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        lock(&self.slept).clone()
    }
}

#[async_trait]
impl Sleeper for FakeSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.slept).push(duration);
    }
}

/// Signer handing out sequential tx ids, or always failing
#[derive(Default)]
pub struct StaticSigner {
    counter: AtomicU64,
    failure: Option<SignerError>,
}

impl StaticSigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: SignerError) -> Self {
        Self {
            counter: AtomicU64::new(0),
            failure: Some(error),
        }
    }

    pub fn signed_count(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Signer for StaticSigner {
    async fn sign(&self, _tx: &UnsignedTx) -> std::result::Result<SignedTx, SignerError> {
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SignedTx::new(fake_tx_id(n), "84a0"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swap_tx::{TxOutput, Value};

    #[tokio::test]
    async fn test_memory_ledger_applies_signed_plan() {
        let wallet = Address::new("addr_test1wallet");
        let ledger = MemoryLedger::new();
        ledger.add_utxo(Utxo::new(
            OutputRef::new("aa", 0),
            TxOutput::new(wallet.clone(), Value::lovelace(10_000_000)),
        ));

        let mut plan = UnsignedTx::new(wallet.clone(), 120);
        plan.add_input(ledger.utxos_at(&wallet)[0].clone());
        plan.add_output(TxOutput::new(wallet.clone(), Value::lovelace(5_000_000)));

        let signed = ledger.sign(&plan).await.unwrap();
        assert!(matches!(
            ledger.is_confirmed(&signed.tx_id).await,
            Err(ProviderError::NotFound { .. })
        ));

        ledger.submit(&signed).await.unwrap();
        let utxos = ledger.get_utxos(&wallet).await.unwrap();
        assert_eq!(utxos.len(), 1);
        assert_eq!(utxos[0].coin(), 5_000_000);
        assert_eq!(utxos[0].input.tx_id, signed.tx_id);
        assert!(ledger.is_confirmed(&signed.tx_id).await.unwrap());
        assert_eq!(ledger.submitted_plans(), vec![plan]);
    }

    #[tokio::test]
    async fn test_static_signer_sequential_ids() {
        let signer = StaticSigner::new();
        let plan = UnsignedTx::new(Address::new("addr_test1"), 120);
        let a = signer.sign(&plan).await.unwrap();
        let b = signer.sign(&plan).await.unwrap();
        assert_ne!(a.tx_id, b.tx_id);
        assert_eq!(a.tx_id.as_str().len(), 64);
        assert_eq!(signer.signed_count(), 2);
    }
}
