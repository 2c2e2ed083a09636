//! Subcommand handlers
//!
//! Each handler maps one subcommand onto one `SwapContract` operation and
//! prints the result.

pub mod odv;
pub mod oracle;
pub mod swap_contract;
pub mod trade;
pub mod user;

use ledger_client::{SubmissionOutcome, SubmissionStatus};

/// Print a submission outcome; non-success statuses become an error exit.
pub(crate) fn report_submission(label: &str, outcome: &SubmissionOutcome) -> anyhow::Result<()> {
    let tx_id = outcome
        .tx_id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!("{}: {} (tx {})", label, outcome.status.as_str(), tx_id);
    if outcome.status.is_success() {
        return Ok(());
    }
    match &outcome.status {
        SubmissionStatus::Error(detail) => {
            anyhow::bail!("{} failed: {}", label, detail)
        }
        SubmissionStatus::Timeout => anyhow::bail!(
            "{} not confirmed after {} checks; it may still land",
            label,
            outcome.attempts
        ),
        status => anyhow::bail!("{} failed: {}", label, status.as_str()),
    }
}
