// SPDX-License-Identifier: MIT
//! Request tracker — assigns request identities and accumulates per-provider
//! responses until the merge fires.
//!
//! Identity assignment replicates the historical scheme exactly: the
//! counter advances only after a dispatch whose caller asked for a
//! response, so fire-and-forget dispatches reuse the same id as the next
//! response-requiring one. Changing this would alter id-reuse semantics
//! hosts rely on.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::error::{BrokerError, Result};
use crate::model::{RequestKind, ResponseHandler};

/// In-flight request state, accumulated until the principal responds.
pub struct PendingRequest {
    pub kind: RequestKind,
    pub language: String,
    pub handler: Arc<dyn ResponseHandler>,
    /// Providers this request was actually sent to.
    pub asked: Vec<String>,
    /// Raw responses received so far, keyed by provider name.
    pub responses: HashMap<String, Value>,
}

pub struct RequestTracker {
    pending: HashMap<u64, PendingRequest>,
    next_id: u64,
    max_pending: Option<usize>,
}

impl RequestTracker {
    pub fn new(max_pending: Option<usize>) -> Self {
        Self {
            pending: HashMap::new(),
            next_id: 0,
            max_pending,
        }
    }

    /// The id the next dispatch will be tagged with.
    pub fn current_id(&self) -> u64 {
        self.next_id
    }

    /// Advance the counter. Called once per dispatch that requires a
    /// response, after fan-out.
    pub fn advance(&mut self) {
        self.next_id += 1;
    }

    /// Record that `id` was dispatched to `provider`, creating the pending
    /// entry on the first call for this id.
    ///
    /// With `max_pending` set, creating a new entry at the bound evicts
    /// the oldest pending request (smallest id) first.
    pub fn track(
        &mut self,
        id: u64,
        kind: RequestKind,
        language: &str,
        handler: Arc<dyn ResponseHandler>,
        provider: &str,
    ) {
        if !self.pending.contains_key(&id) {
            if let Some(max) = self.max_pending {
                while self.pending.len() >= max {
                    let Some(oldest) = self.pending.keys().min().copied() else {
                        break;
                    };
                    self.pending.remove(&oldest);
                    warn!(
                        request_id = oldest,
                        max_pending = max,
                        "pending-request bound reached; evicting oldest request"
                    );
                }
            }
            self.pending.insert(
                id,
                PendingRequest {
                    kind,
                    language: language.to_string(),
                    handler,
                    asked: Vec::new(),
                    responses: HashMap::new(),
                },
            );
        }
        let entry = self.pending.get_mut(&id).expect("entry inserted above");
        if !entry.asked.iter().any(|p| p == provider) {
            entry.asked.push(provider.to_string());
        }
    }

    /// Store `provider`'s raw response under `id` and return the request
    /// kind, so the caller can resolve the principal.
    pub fn record_response(&mut self, id: u64, provider: &str, payload: Value) -> Result<RequestKind> {
        let entry = self
            .pending
            .get_mut(&id)
            .ok_or(BrokerError::UnknownRequest(id))?;
        if !entry.asked.iter().any(|p| p == provider) {
            return Err(BrokerError::UnexpectedProvider {
                provider: provider.to_string(),
                request_id: id,
            });
        }
        entry.responses.insert(provider.to_string(), payload);
        Ok(entry.kind)
    }

    /// Remove and return the pending request, so late arrivals for the
    /// same id hit the unknown-request path.
    pub fn retire(&mut self, id: u64) -> Option<PendingRequest> {
        self.pending.remove(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
