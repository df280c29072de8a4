//! # Request Correlation
//!
//! Pairs requests with their responses across the relay.
//!
//! ## Settlement model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      REQUEST LIFECYCLE                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  send(request)                                                          │
//! │    1. subscribe to the response bus     ← BEFORE publishing, so a      │
//! │    2. publish the serialized request      fast responder cannot race   │
//! │    3. return PendingResponse              the subscription             │
//! │                                                                         │
//! │  PendingResponse::response()  — settles EXACTLY ONCE:                   │
//! │                                                                         │
//! │    message on response bus                                             │
//! │      ├── does not decode          → reject ProtocolDecodeError         │
//! │      ├── id or reference mismatch → ignore, keep waiting               │
//! │      │                              (deadline untouched)               │
//! │      ├── matches, error set       → reject RequestRejected             │
//! │      └── matches, result set      → resolve                            │
//! │                                                                         │
//! │    deadline reached               → reject Timeout                     │
//! │    cancel() / drop                → no settlement at all               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each pending request owns its subscription and deadline, so any number
//! can be in flight and settling one never disturbs another. Consuming
//! `self` in `response()` is what makes double settlement unrepresentable.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{timeout_at, Instant};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::protocol::bus::MessageBus;
use crate::protocol::envelope::{RequestEnvelope, ResponseEnvelope, ResponsePayload};

/// Default per-request timeout
///
/// Responses usually wait on a human approving a prompt, so the default
/// is generous; callers override it per request where that is wrong.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Sends requests and hands out correlation handles
#[derive(Clone)]
pub struct RequestCorrelator {
    requests: MessageBus,
    responses: MessageBus,
    default_timeout: Duration,
}

impl RequestCorrelator {
    /// Create a correlator over a request/response bus pair
    pub fn new(requests: MessageBus, responses: MessageBus) -> Self {
        Self::with_timeout(requests, responses, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a correlator with a custom default timeout
    pub fn with_timeout(
        requests: MessageBus,
        responses: MessageBus,
        default_timeout: Duration,
    ) -> Self {
        Self {
            requests,
            responses,
            default_timeout,
        }
    }

    /// Publish a request and return the handle that will settle it
    ///
    /// The response subscription is created before the request is
    /// published. `response_reference` is the only channel the returned
    /// handle will accept a response on.
    pub fn send(
        &self,
        request: &RequestEnvelope,
        response_reference: &str,
        timeout: Option<Duration>,
    ) -> Result<PendingResponse> {
        let rx = self.responses.subscribe();
        let raw = serde_json::to_string(request)?;

        tracing::debug!(id = %request.id, reference = %request.reference, "request published");
        self.requests.publish(raw);

        Ok(PendingResponse {
            request_id: request.id,
            reference: response_reference.to_string(),
            rx,
            deadline: Instant::now() + timeout.unwrap_or(self.default_timeout),
        })
    }
}

/// A request awaiting its response
///
/// Settles exactly once via [`response`](Self::response); dropping it
/// abandons the request with no settlement.
pub struct PendingResponse {
    request_id: Uuid,
    reference: String,
    rx: broadcast::Receiver<String>,
    deadline: Instant,
}

impl PendingResponse {
    /// ID of the request this handle is waiting on
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Wait for the matching response
    ///
    /// Resolves with the result payload, or rejects with:
    /// - `Timeout` when the deadline passes first
    /// - `ProtocolDecodeError` when a response-channel message does not
    ///   decode, or a matching response carries neither result nor error
    /// - `RequestRejected` when the matching response carries an error
    /// - `RelayClosed` when the response bus shuts down
    pub async fn response(mut self) -> Result<ResponsePayload> {
        loop {
            let raw = match timeout_at(self.deadline, self.rx.recv()).await {
                Err(_) => {
                    return Err(Error::Timeout(format!(
                        "no response for request {}",
                        self.request_id
                    )))
                }
                Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    tracing::warn!(id = %self.request_id, skipped, "response subscription lagged");
                    continue;
                }
                Ok(Err(broadcast::error::RecvError::Closed)) => return Err(Error::RelayClosed),
                Ok(Ok(raw)) => raw,
            };

            let envelope: ResponseEnvelope = serde_json::from_str(&raw)
                .map_err(|e| Error::ProtocolDecodeError(e.to_string()))?;

            // Someone else's response; our deadline keeps running
            if envelope.request_id != self.request_id || envelope.reference != self.reference {
                continue;
            }

            if let Some(error) = envelope.error {
                return Err(Error::RequestRejected {
                    code: error.code,
                    message: error.message,
                });
            }

            return envelope.result.ok_or_else(|| {
                Error::ProtocolDecodeError("response carries neither result nor error".into())
            });
        }
    }

    /// Abandon the request
    ///
    /// Equivalent to dropping the handle: the subscription ends and no
    /// settlement ever happens. Any response arriving later is ignored by
    /// construction.
    pub fn cancel(self) {}
}

// ============================================================================
// TESTS
// ============================================================================
