//! External signer process
//!
//! The wallet's key material never enters this process. Each unsigned
//! transaction plan is piped as JSON to a configured command, which balances,
//! witnesses and serializes it, then answers with one JSON object on stdout:
//!
//! ```json
//! {"status": "ok", "txId": "…", "cborHex": "…"}
//! {"status": "insufficient_funds", "message": "…"}
//! ```

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use ledger_client::Signer;
use serde::Deserialize;
use swap_core::{SignerConfig, SignerError};
use swap_tx::{SignedTx, UnsignedTx};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const SIGN_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum SignerResponse {
    Ok {
        #[serde(rename = "txId")]
        tx_id: String,
        #[serde(rename = "cborHex")]
        cbor_hex: String,
    },
    InsufficientFunds {
        message: String,
    },
    UtxoSelection {
        message: String,
    },
    Error {
        message: String,
    },
}

/// Signs by spawning `command args…` once per transaction
#[derive(Debug, Clone)]
pub struct CommandSigner {
    command: String,
    args: Vec<String>,
}

impl CommandSigner {
    pub fn from_config(config: &SignerConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }

    async fn exchange(&self, payload: String) -> Result<Vec<u8>, SignerError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| failed(format!("Failed to start {}: {}", self.command, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(payload.as_bytes())
                .await
                .map_err(|e| failed(format!("Failed to write to signer: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| failed(format!("Signer did not finish: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!(
                "Signer exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl Signer for CommandSigner {
    async fn sign(&self, tx: &UnsignedTx) -> Result<SignedTx, SignerError> {
        let payload = tx
            .to_json()
            .map_err(|e| failed(format!("Failed to serialize plan: {}", e)))?;

        tracing::debug!(
            command = %self.command,
            outputs = tx.outputs.len(),
            "Handing transaction to signer"
        );

        let stdout = tokio::time::timeout(SIGN_TIMEOUT, self.exchange(payload))
            .await
            .map_err(|_| failed(format!("Signer timed out after {:?}", SIGN_TIMEOUT)))??;

        let signed = parse_response(&stdout)?;
        tracing::info!(tx_id = %signed.tx_id, "Transaction signed");
        Ok(signed)
    }
}

fn failed(message: String) -> SignerError {
    SignerError::Failed { message }
}

/// Decode the signer's stdout
pub fn parse_response(stdout: &[u8]) -> Result<SignedTx, SignerError> {
    let response: SignerResponse = serde_json::from_slice(stdout)
        .map_err(|e| failed(format!("Malformed signer response: {}", e)))?;

    match response {
        SignerResponse::Ok { tx_id, cbor_hex } => Ok(SignedTx::new(tx_id, cbor_hex)),
        SignerResponse::InsufficientFunds { message } => {
            Err(SignerError::InsufficientFunds { message })
        }
        SignerResponse::UtxoSelection { message } => Err(SignerError::UtxoSelection { message }),
        SignerResponse::Error { message } => Err(SignerError::Failed { message }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> UnsignedTx {
        UnsignedTx::new(swap_core::Address::new("addr_test1qz"), 300)
    }

    #[test]
    fn test_parse_ok() {
        let signed =
            parse_response(br#"{"status":"ok","txId":"abcd","cborHex":"84a400"}"#).unwrap();
        assert_eq!(signed.tx_id.as_str(), "abcd");
        assert_eq!(signed.cbor_hex, "84a400");
    }

    #[test]
    fn test_parse_failures() {
        let err = parse_response(br#"{"status":"insufficient_funds","message":"need 3 ADA"}"#)
            .unwrap_err();
        assert!(matches!(err, SignerError::InsufficientFunds { ref message } if message == "need 3 ADA"));

        let err =
            parse_response(br#"{"status":"utxo_selection","message":"no inputs"}"#).unwrap_err();
        assert!(matches!(err, SignerError::UtxoSelection { .. }));

        let err = parse_response(br#"{"status":"error","message":"bad key"}"#).unwrap_err();
        assert!(matches!(err, SignerError::Failed { .. }));
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_response(b"not json").unwrap_err();
        assert!(err.to_string().contains("Malformed signer response"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sign_via_shell() {
        let signer = CommandSigner::from_config(&SignerConfig {
            command: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                r#"cat > /dev/null; echo '{"status":"ok","txId":"ff00","cborHex":"84"}'"#
                    .to_string(),
            ],
        });
        let signed = signer.sign(&plan()).await.unwrap();
        assert_eq!(signed.tx_id.as_str(), "ff00");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sign_nonzero_exit() {
        let signer = CommandSigner::from_config(&SignerConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), "cat > /dev/null; echo boom >&2; exit 3".to_string()],
        });
        let err = signer.sign(&plan()).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
