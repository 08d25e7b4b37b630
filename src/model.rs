// SPDX-License-Identifier: MIT
//! Broker data model — request kinds, completion items, and the dispatch
//! envelope.
//!
//! Payloads are opaque `serde_json::Value`s end to end; the broker only
//! looks inside them for the completion-kind merge, where each item must
//! expose an `insertText` (dedup identity) and a `sortText` (priority
//! rewrite target).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

// ─── Request kinds ────────────────────────────────────────────────────────────

/// The category of a request or notification, used to select the priority
/// policy entry. Serialized as the corresponding LSP method string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    #[serde(rename = "textDocument/completion")]
    DocumentCompletion,
    #[serde(rename = "textDocument/signatureHelp")]
    DocumentSignature,
    #[serde(rename = "textDocument/hover")]
    DocumentHover,
    #[serde(rename = "textDocument/documentSymbol")]
    DocumentSymbol,
    #[serde(rename = "textDocument/definition")]
    DocumentDefinition,
    #[serde(rename = "textDocument/didOpen")]
    DocumentDidOpen,
    #[serde(rename = "textDocument/didChange")]
    DocumentDidChange,
    #[serde(rename = "textDocument/didClose")]
    DocumentDidClose,
    #[serde(rename = "workspace/didChangeConfiguration")]
    WorkspaceConfigurationChange,
}

/// Kind of project-path update fanned out to providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileUpdateKind {
    Addition,
    Deletion,
}

// ─── Completion items ─────────────────────────────────────────────────────────

/// A single completion suggestion as seen by the merge.
///
/// Only `insertText` and `sortText` are interpreted; every other field a
/// provider attaches travels through the merge untouched via `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionItem {
    /// The text inserted when the item is accepted — the dedup identity.
    #[serde(rename = "insertText")]
    pub insert_text: String,
    /// Sort key; novel non-principal items get a run of `'z'`s prefixed
    /// here so they order after the principal's items.
    #[serde(rename = "sortText", default)]
    pub sort_text: String,
    /// Provider-specific fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ─── Dispatch envelope ────────────────────────────────────────────────────────

/// Receives the single merged answer for a dispatched request.
pub trait ResponseHandler: Send + Sync {
    fn handle_response(&self, kind: RequestKind, merged: Value);
}

/// A request handed to [`CompletionBroker::dispatch`].
///
/// `requires_response` controls whether the broker advances its request
/// counter after fan-out; dispatches that expect no answer reuse the same
/// id as the next response-requiring dispatch.
///
/// [`CompletionBroker::dispatch`]: crate::broker::CompletionBroker::dispatch
pub struct DispatchRequest {
    /// Opaque request parameters forwarded to every running provider.
    pub params: Value,
    /// Callback target for the merged answer.
    pub handler: Arc<dyn ResponseHandler>,
    /// Whether the caller expects a merged answer back.
    pub requires_response: bool,
}

impl DispatchRequest {
    pub fn new(params: Value, handler: Arc<dyn ResponseHandler>) -> Self {
        Self {
            params,
            handler,
            requires_response: true,
        }
    }
}
