//! # Cross-Context Protocol
//!
//! Request/response plumbing between the page-embedded client and the
//! privileged wallet context.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      PROTOCOL TOPOLOGY                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Page client                 untrusted relay           Privileged side  │
//! │  ───────────                 ───────────────           ───────────────  │
//! │                                                                         │
//! │  RequestCorrelator ──send──► [ request bus ] ─────► SigningGateway      │
//! │        │                                                  │             │
//! │        │                                                  ▼             │
//! │  PendingResponse  ◄───────── [ response bus ] ◄──── one response        │
//! │  (id + reference                                    per request         │
//! │   matching, timeout)                                                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The relay carries only JSON text and is trusted with nothing: every
//! message is validated into a closed envelope type at the boundary, and
//! responses are paired with requests by ID and channel reference.

pub mod bus;
pub mod correlator;
pub mod envelope;
pub mod gateway;

pub use bus::MessageBus;
pub use correlator::{PendingResponse, RequestCorrelator, DEFAULT_REQUEST_TIMEOUT};
pub use envelope::{
    reference, RequestEnvelope, RequestPayload, ResponseEnvelope, ResponseError, ResponsePayload,
    UnsignedTransaction,
};
pub use gateway::SigningGateway;
