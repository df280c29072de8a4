//! # Wire Envelopes
//!
//! The JSON shapes that cross the relay.
//!
//! ## Format
//!
//! ```text
//! Request:
//! {
//!   "id": "<uuid>",
//!   "reference": "aegis:sign_bytes:request",
//!   "payload": { "type": "sign_bytes", "signer": "<hex>", "data": "<base64>" },
//!   "origin": "https://dapp.example"          (optional)
//! }
//!
//! Response:
//! {
//!   "requestID": "<uuid>",
//!   "reference": "aegis:sign_bytes:response",
//!   "result": { "type": "sign_bytes", "signature": "<base64>" },
//!   "error": null
//! }
//! ```
//!
//! Payloads are closed tagged unions: anything that does not match a known
//! `type` fails deserialization at the boundary instead of flowing through
//! as loosely shaped JSON. A response settles a request iff BOTH
//! `requestID` and `reference` match what the sender expects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Channel reference strings
///
/// Each method has a request channel and a response channel; the sender
/// of a request listens only on the matching response channel.
pub mod reference {
    /// Enable (connect) request channel
    pub const ENABLE_REQUEST: &str = "aegis:enable:request";
    /// Enable (connect) response channel
    pub const ENABLE_RESPONSE: &str = "aegis:enable:response";

    /// Arbitrary-bytes signing request channel
    pub const SIGN_BYTES_REQUEST: &str = "aegis:sign_bytes:request";
    /// Arbitrary-bytes signing response channel
    pub const SIGN_BYTES_RESPONSE: &str = "aegis:sign_bytes:response";

    /// Transaction signing request channel
    pub const SIGN_TRANSACTIONS_REQUEST: &str = "aegis:sign_transactions:request";
    /// Transaction signing response channel
    pub const SIGN_TRANSACTIONS_RESPONSE: &str = "aegis:sign_transactions:response";

    /// The response channel paired with a request channel
    pub fn response_for(request: &str) -> Option<&'static str> {
        match request {
            ENABLE_REQUEST => Some(ENABLE_RESPONSE),
            SIGN_BYTES_REQUEST => Some(SIGN_BYTES_RESPONSE),
            SIGN_TRANSACTIONS_REQUEST => Some(SIGN_TRANSACTIONS_RESPONSE),
            _ => None,
        }
    }
}

/// A correlated request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Unique request ID (UUID v4)
    pub id: Uuid,
    /// Request channel reference
    pub reference: String,
    /// Method-specific payload
    pub payload: RequestPayload,
    /// Originating page, when the client knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl RequestEnvelope {
    /// Build a request with a fresh v4 ID on the payload's request channel
    pub fn new(payload: RequestPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            reference: payload.request_reference().to_string(),
            payload,
            origin: None,
        }
    }

    /// Attach the originating page
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Method-specific request payloads (closed union)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestPayload {
    /// Connect and list available accounts
    Enable {
        /// Network the caller wants to operate on
        #[serde(default, skip_serializing_if = "Option::is_none")]
        network: Option<String>,
    },

    /// Sign arbitrary bytes
    SignBytes {
        /// Public key (hex) of the requested signer
        signer: String,
        /// Bytes to sign, base64-encoded
        data: String,
    },

    /// Sign a batch of transactions
    SignTransactions {
        /// Transactions in submission order
        transactions: Vec<UnsignedTransaction>,
    },
}

impl RequestPayload {
    /// The request channel this payload belongs on
    pub fn request_reference(&self) -> &'static str {
        match self {
            Self::Enable { .. } => reference::ENABLE_REQUEST,
            Self::SignBytes { .. } => reference::SIGN_BYTES_REQUEST,
            Self::SignTransactions { .. } => reference::SIGN_TRANSACTIONS_REQUEST,
        }
    }
}

/// One transaction awaiting signature
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    /// Canonical transaction bytes, base64-encoded
    pub txn: String,
    /// Public key (hex) of the signer; omitted when the wallet's sole
    /// account should sign
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
}

/// Method-specific response payloads (closed union)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    /// Accounts made available to the caller
    Enable {
        /// Session identifier for the connection
        session_id: String,
        /// Public keys (hex) of available accounts
        accounts: Vec<String>,
    },

    /// Signature over arbitrary bytes
    SignBytes {
        /// Ed25519 signature, base64-encoded
        signature: String,
    },

    /// Signatures over a transaction batch
    SignTransactions {
        /// One base64 signature per transaction, in request order
        signatures: Vec<String>,
    },
}

/// The error half of a response envelope
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Stable numeric code (see [`crate::error::Error::code`])
    pub code: i32,
    /// Human-readable message
    pub message: String,
}

impl From<&Error> for ResponseError {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// A correlated response
///
/// Exactly one of `result` / `error` is populated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// ID of the request this answers
    #[serde(rename = "requestID")]
    pub request_id: Uuid,
    /// Response channel reference
    pub reference: String,
    /// Successful result, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResponsePayload>,
    /// Error, if the request failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl ResponseEnvelope {
    /// Build a success response
    pub fn success(request_id: Uuid, reference: impl Into<String>, result: ResponsePayload) -> Self {
        Self {
            request_id,
            reference: reference.into(),
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response
    pub fn failure(request_id: Uuid, reference: impl Into<String>, err: &Error) -> Self {
        Self {
            request_id,
            reference: reference.into(),
            result: None,
            error: Some(err.into()),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_json_shape() {
        let request = RequestEnvelope::new(RequestPayload::SignBytes {
            signer: "aa11".into(),
            data: "aGVsbG8=".into(),
        })
        .with_origin("https://dapp.example");

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"reference\":\"aegis:sign_bytes:request\""));
        assert!(json.contains("\"type\":\"sign_bytes\""));
        assert!(json.contains("\"origin\":\"https://dapp.example\""));

        let parsed: RequestEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, request.id);
    }

    #[test]
    fn test_origin_omitted_when_absent() {
        let request = RequestEnvelope::new(RequestPayload::Enable { network: None });
        let json = serde_json::to_string(&request).unwrap();

        assert!(!json.contains("origin"));
        assert!(!json.contains("network"));
    }

    #[test]
    fn test_response_uses_request_id_casing() {
        let envelope = ResponseEnvelope::success(
            Uuid::new_v4(),
            reference::ENABLE_RESPONSE,
            ResponsePayload::Enable {
                session_id: "s-1".into(),
                accounts: vec!["aa11".into()],
            },
        );

        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"requestID\""));
        assert!(!json.contains("\"request_id\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_failure_carries_code_and_message() {
        let err = Error::UnknownAccount("aa11".into());
        let envelope =
            ResponseEnvelope::failure(Uuid::new_v4(), reference::SIGN_BYTES_RESPONSE, &err);

        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: ResponseEnvelope = serde_json::from_str(&json).unwrap();

        let error = parsed.error.unwrap();
        assert_eq!(error.code, 403);
        assert!(error.message.contains("aa11"));
        assert!(parsed.result.is_none());
    }

    #[test]
    fn test_unknown_payload_type_rejected() {
        let json = r#"{
            "id": "7f1c9f2e-6d5a-4b3c-8e1d-2a9b8c7d6e5f",
            "reference": "aegis:enable:request",
            "payload": { "type": "drain_wallet" }
        }"#;

        assert!(serde_json::from_str::<RequestEnvelope>(json).is_err());
    }

    #[test]
    fn test_response_for_mapping() {
        assert_eq!(
            reference::response_for(reference::SIGN_BYTES_REQUEST),
            Some(reference::SIGN_BYTES_RESPONSE)
        );
        assert_eq!(reference::response_for("aegis:bogus"), None);
    }
}
