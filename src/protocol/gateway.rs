//! # Signing Gateway
//!
//! The privileged side of the protocol: consumes raw requests off the
//! relay, resolves keys from the vault, and publishes exactly one response
//! per correlatable request.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      GATEWAY DISPATCH                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  raw message                                                            │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  parse outer shape (id + reference + raw payload)                       │
//! │      │         └── fails → log and drop (nothing to correlate)          │
//! │      ▼                                                                  │
//! │  parse method payload (closed union, checked against the channel)       │
//! │      │         └── fails → ONE error response (ProtocolDecodeError)     │
//! │      ▼                                                                  │
//! │  enable / sign_bytes / sign_transactions                                │
//! │      │         └── fails → ONE error response ({ code, message })       │
//! │      ▼                                                                  │
//! │  ONE success response on the method's response channel                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The outer shape is parsed separately from the payload so that even a
//! malformed payload still produces a correlated error response instead of
//! a silent drop.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signer, SigningKey};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::protocol::bus::MessageBus;
use crate::protocol::envelope::{
    reference, RequestPayload, ResponseEnvelope, ResponsePayload, UnsignedTransaction,
};
use crate::vault::{PrivateKeyVault, UnlockFactor};

/// Outer request shape, parsed before the method payload so malformed
/// payloads can still be answered
#[derive(Deserialize)]
struct RawRequest {
    id: Uuid,
    reference: String,
    payload: serde_json::Value,
}

/// Handles signing requests against the vault
pub struct SigningGateway {
    vault: Arc<PrivateKeyVault>,
    responses: MessageBus,
}

impl SigningGateway {
    /// Create a gateway publishing responses on `responses`
    pub fn new(vault: Arc<PrivateKeyVault>, responses: MessageBus) -> Self {
        Self { vault, responses }
    }

    /// Process one raw request from the relay
    ///
    /// Publishes exactly one response for every request whose outer shape
    /// parses. A message without a parseable outer shape cannot be
    /// correlated, so it is dropped and the decode error returned to the
    /// caller.
    pub async fn handle(&self, raw: &str, factor: &UnlockFactor) -> Result<()> {
        let outer: RawRequest = serde_json::from_str(raw).map_err(|e| {
            tracing::warn!(error = %e, "dropping uncorrelatable relay message");
            Error::ProtocolDecodeError(e.to_string())
        })?;

        // Unknown channels get their reference echoed back; for known
        // channels the response goes on the paired response channel
        let (response_reference, outcome) = match reference::response_for(&outer.reference) {
            Some(response_reference) => (
                response_reference.to_string(),
                self.dispatch(&outer.reference, outer.payload, factor).await,
            ),
            None => (
                outer.reference.clone(),
                Err(Error::UnknownMethod(outer.reference.clone())),
            ),
        };

        let envelope = match outcome {
            Ok(result) => ResponseEnvelope::success(outer.id, response_reference, result),
            Err(err) => {
                tracing::debug!(id = %outer.id, code = err.code(), "request failed: {}", err);
                ResponseEnvelope::failure(outer.id, response_reference, &err)
            }
        };

        self.responses.publish(serde_json::to_string(&envelope)?);
        Ok(())
    }

    async fn dispatch(
        &self,
        request_reference: &str,
        payload: serde_json::Value,
        factor: &UnlockFactor,
    ) -> Result<ResponsePayload> {
        let payload: RequestPayload = serde_json::from_value(payload)
            .map_err(|e| Error::ProtocolDecodeError(e.to_string()))?;

        if payload.request_reference() != request_reference {
            return Err(Error::ProtocolDecodeError(
                "payload does not match request channel".into(),
            ));
        }

        match payload {
            RequestPayload::Enable { .. } => self.enable().await,
            RequestPayload::SignBytes { signer, data } => {
                self.sign_bytes(&signer, &data, factor).await
            }
            RequestPayload::SignTransactions { transactions } => {
                self.sign_transactions(&transactions, factor).await
            }
        }
    }

    async fn enable(&self) -> Result<ResponsePayload> {
        let accounts = self.vault.list_public_keys().await?;

        Ok(ResponsePayload::Enable {
            session_id: Uuid::new_v4().to_string(),
            accounts,
        })
    }

    async fn sign_bytes(
        &self,
        signer: &str,
        data: &str,
        factor: &UnlockFactor,
    ) -> Result<ResponsePayload> {
        let message = BASE64
            .decode(data)
            .map_err(|e| Error::ProtocolDecodeError(format!("data is not valid base64: {}", e)))?;

        let signature = self.sign_with(signer, &message, factor).await?;

        Ok(ResponsePayload::SignBytes {
            signature: BASE64.encode(signature),
        })
    }

    async fn sign_transactions(
        &self,
        transactions: &[UnsignedTransaction],
        factor: &UnlockFactor,
    ) -> Result<ResponsePayload> {
        let mut signatures = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            let bytes = BASE64.decode(&transaction.txn).map_err(|e| {
                Error::ProtocolDecodeError(format!("transaction is not valid base64: {}", e))
            })?;

            let signer = match &transaction.signer {
                Some(signer) => signer.clone(),
                None => self.sole_account().await?,
            };

            let signature = self.sign_with(&signer, &bytes, factor).await?;
            signatures.push(BASE64.encode(signature));
        }

        Ok(ResponsePayload::SignTransactions { signatures })
    }

    /// The vault's only account, for transactions that omit a signer
    async fn sole_account(&self) -> Result<String> {
        let mut accounts = self.vault.list_public_keys().await?;
        if accounts.len() == 1 {
            Ok(accounts.remove(0))
        } else {
            Err(Error::UnknownAccount(
                "no signer specified and the wallet does not hold exactly one account".into(),
            ))
        }
    }

    async fn sign_with(
        &self,
        signer: &str,
        message: &[u8],
        factor: &UnlockFactor,
    ) -> Result<[u8; 64]> {
        let seed = self
            .vault
            .get_private_key(signer, factor)
            .await?
            .ok_or_else(|| Error::UnknownAccount(signer.to_string()))?;

        let seed: [u8; 32] = seed
            .as_slice()
            .try_into()
            .map_err(|_| Error::InvalidKey("private key must be 32 bytes".into()))?;

        let signing_key = SigningKey::from_bytes(&seed);
        Ok(signing_key.sign(message).to_bytes())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::KdfParams;
    use crate::protocol::correlator::RequestCorrelator;
    use crate::protocol::envelope::RequestEnvelope;
    use crate::vault::MemoryVaultStore;
    use ed25519_dalek::{Verifier, VerifyingKey};
    use rand::rngs::OsRng;

    struct Fixture {
        vault: Arc<PrivateKeyVault>,
        gateway: SigningGateway,
        correlator: RequestCorrelator,
        requests: MessageBus,
        factor: UnlockFactor,
    }

    async fn fixture() -> Fixture {
        let requests = MessageBus::default();
        let responses = MessageBus::default();

        let vault = Arc::new(PrivateKeyVault::with_kdf_params(
            Arc::new(MemoryVaultStore::new()),
            KdfParams { iterations: 1_000 },
        ));
        let factor = UnlockFactor::password("pw");
        vault.initialize(&factor).await.unwrap();

        Fixture {
            gateway: SigningGateway::new(vault.clone(), responses.clone()),
            correlator: RequestCorrelator::new(requests.clone(), responses),
            vault,
            requests,
            factor,
        }
    }

    async fn add_account(fx: &Fixture) -> (String, VerifyingKey) {
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_hex = hex::encode(signing_key.verifying_key().to_bytes());
        fx.vault
            .set_private_key(&public_hex, &signing_key.to_bytes(), &fx.factor)
            .await
            .unwrap();
        (public_hex, signing_key.verifying_key())
    }

    /// Drive one request through correlator → gateway → correlator
    async fn round_trip(
        fx: &Fixture,
        request: &RequestEnvelope,
        response_reference: &str,
    ) -> Result<ResponsePayload> {
        let mut relay = fx.requests.subscribe();
        let pending = fx.correlator.send(request, response_reference, None)?;

        let raw = relay.recv().await.unwrap();
        fx.gateway.handle(&raw, &fx.factor).await?;

        pending.response().await
    }

    #[tokio::test]
    async fn test_enable_lists_accounts() {
        let fx = fixture().await;
        let (public_hex, _) = add_account(&fx).await;

        let request = RequestEnvelope::new(RequestPayload::Enable { network: None });
        let payload = round_trip(&fx, &request, reference::ENABLE_RESPONSE)
            .await
            .unwrap();

        match payload {
            ResponsePayload::Enable {
                accounts,
                session_id,
            } => {
                assert_eq!(accounts, vec![public_hex]);
                assert!(!session_id.is_empty());
            }
            other => panic!("expected enable payload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sign_bytes_end_to_end() {
        let fx = fixture().await;
        let (public_hex, verifying_key) = add_account(&fx).await;

        let message = b"important bytes";
        let request = RequestEnvelope::new(RequestPayload::SignBytes {
            signer: public_hex,
            data: BASE64.encode(message),
        });

        let payload = round_trip(&fx, &request, reference::SIGN_BYTES_RESPONSE)
            .await
            .unwrap();

        let signature = match payload {
            ResponsePayload::SignBytes { signature } => signature,
            other => panic!("expected sign_bytes payload, got {:?}", other),
        };

        let signature_bytes: [u8; 64] =
            BASE64.decode(signature).unwrap().try_into().unwrap();
        verifying_key
            .verify(message, &ed25519_dalek::Signature::from_bytes(&signature_bytes))
            .unwrap();
    }

    #[tokio::test]
    async fn test_sign_transactions_with_explicit_signers() {
        let fx = fixture().await;
        let (pub_a, key_a) = add_account(&fx).await;
        let (pub_b, key_b) = add_account(&fx).await;

        let txn_1 = b"transaction one";
        let txn_2 = b"transaction two";
        let request = RequestEnvelope::new(RequestPayload::SignTransactions {
            transactions: vec![
                UnsignedTransaction {
                    txn: BASE64.encode(txn_1),
                    signer: Some(pub_a),
                },
                UnsignedTransaction {
                    txn: BASE64.encode(txn_2),
                    signer: Some(pub_b),
                },
            ],
        });

        let payload = round_trip(&fx, &request, reference::SIGN_TRANSACTIONS_RESPONSE)
            .await
            .unwrap();

        let signatures = match payload {
            ResponsePayload::SignTransactions { signatures } => signatures,
            other => panic!("expected sign_transactions payload, got {:?}", other),
        };
        assert_eq!(signatures.len(), 2);

        let sig_1: [u8; 64] = BASE64.decode(&signatures[0]).unwrap().try_into().unwrap();
        let sig_2: [u8; 64] = BASE64.decode(&signatures[1]).unwrap().try_into().unwrap();
        key_a
            .verify(txn_1, &ed25519_dalek::Signature::from_bytes(&sig_1))
            .unwrap();
        key_b
            .verify(txn_2, &ed25519_dalek::Signature::from_bytes(&sig_2))
            .unwrap();
    }

    #[tokio::test]
    async fn test_omitted_signer_falls_back_to_sole_account() {
        let fx = fixture().await;
        let (_, verifying_key) = add_account(&fx).await;

        let txn = b"single account transaction";
        let request = RequestEnvelope::new(RequestPayload::SignTransactions {
            transactions: vec![UnsignedTransaction {
                txn: BASE64.encode(txn),
                signer: None,
            }],
        });

        let payload = round_trip(&fx, &request, reference::SIGN_TRANSACTIONS_RESPONSE)
            .await
            .unwrap();

        let signatures = match payload {
            ResponsePayload::SignTransactions { signatures } => signatures,
            other => panic!("expected sign_transactions payload, got {:?}", other),
        };
        let sig: [u8; 64] = BASE64.decode(&signatures[0]).unwrap().try_into().unwrap();
        verifying_key
            .verify(txn, &ed25519_dalek::Signature::from_bytes(&sig))
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_signer_answered_with_error() {
        let fx = fixture().await;

        let request = RequestEnvelope::new(RequestPayload::SignBytes {
            signer: "ff00".into(),
            data: BASE64.encode(b"bytes"),
        });

        let result = round_trip(&fx, &request, reference::SIGN_BYTES_RESPONSE).await;
        assert!(matches!(
            result,
            Err(Error::RequestRejected { code: 403, .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_payload_answered_with_error() {
        let fx = fixture().await;
        let responses = fx.gateway.responses.clone();
        let mut rx = responses.subscribe();

        let id = Uuid::new_v4();
        let raw = format!(
            r#"{{"id":"{}","reference":"{}","payload":{{"type":"sign_bytes"}}}}"#,
            id,
            reference::SIGN_BYTES_REQUEST
        );
        fx.gateway.handle(&raw, &fx.factor).await.unwrap();

        let envelope: ResponseEnvelope =
            serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(envelope.request_id, id);
        assert_eq!(envelope.error.unwrap().code, 401);
    }

    #[tokio::test]
    async fn test_payload_on_wrong_channel_answered_with_error() {
        let fx = fixture().await;
        let mut rx = fx.gateway.responses.subscribe();

        // Enable payload riding the sign_bytes channel
        let raw = format!(
            r#"{{"id":"{}","reference":"{}","payload":{{"type":"enable"}}}}"#,
            Uuid::new_v4(),
            reference::SIGN_BYTES_REQUEST
        );
        fx.gateway.handle(&raw, &fx.factor).await.unwrap();

        let envelope: ResponseEnvelope =
            serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(envelope.error.unwrap().code, 401);
    }

    #[tokio::test]
    async fn test_unknown_method_answered_with_error() {
        let fx = fixture().await;
        let mut rx = fx.gateway.responses.subscribe();

        let raw = format!(
            r#"{{"id":"{}","reference":"aegis:bogus:request","payload":{{"type":"enable"}}}}"#,
            Uuid::new_v4()
        );
        fx.gateway.handle(&raw, &fx.factor).await.unwrap();

        let envelope: ResponseEnvelope =
            serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(envelope.reference, "aegis:bogus:request");
        assert_eq!(envelope.error.unwrap().code, 402);
    }

    #[tokio::test]
    async fn test_uncorrelatable_message_is_dropped() {
        let fx = fixture().await;
        let mut rx = fx.gateway.responses.subscribe();

        let result = fx.gateway.handle("{ not json", &fx.factor).await;
        assert!(matches!(result, Err(Error::ProtocolDecodeError(_))));

        // No response was published
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_locked_vault_rejects_signing() {
        let fx = fixture().await;
        let (public_hex, _) = add_account(&fx).await;

        let mut relay = fx.requests.subscribe();
        let request = RequestEnvelope::new(RequestPayload::SignBytes {
            signer: public_hex,
            data: BASE64.encode(b"bytes"),
        });
        let pending = fx
            .correlator
            .send(&request, reference::SIGN_BYTES_RESPONSE, None)
            .unwrap();

        // Privileged side holds the wrong factor
        let raw = relay.recv().await.unwrap();
        fx.gateway
            .handle(&raw, &UnlockFactor::password("wrong"))
            .await
            .unwrap();

        assert!(matches!(
            pending.response().await,
            Err(Error::RequestRejected { code: 100, .. })
        ));
    }
}
