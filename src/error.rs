// SPDX-License-Identifier: MIT
//! Broker error taxonomy.
//!
//! Everything here is recoverable: stray responses are logged and dropped,
//! a misconfigured priority policy is surfaced but never panics the broker.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    /// A provider with the same name is already registered.
    #[error("provider `{0}` is already registered")]
    DuplicateProvider(String),

    /// A response arrived for a request id the tracker does not know —
    /// either already merged or never created.
    #[error("no pending request with id {0}")]
    UnknownRequest(u64),

    /// A response arrived from a provider that was never asked to answer
    /// this request.
    #[error("provider `{provider}` was not asked to answer request {request_id}")]
    UnexpectedProvider { provider: String, request_id: u64 },

    /// The priority policy designates a principal provider that was never
    /// registered; the merge for that request kind cannot complete.
    #[error("priority policy names `{0}`, which is not a registered provider")]
    MissingPrincipal(String),
}

pub type Result<T> = std::result::Result<T, BrokerError>;
