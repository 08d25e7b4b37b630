// SPDX-License-Identifier: MIT
//! The provider seam — the trait a completion backend implements, and the
//! events it emits back to the broker.
//!
//! A provider is an independent backend (a language-server client, a
//! heuristic fallback engine, …). The broker never calls into a provider
//! for answers synchronously: requests are fire-and-forget, and results
//! come back as [`ProviderEvent`]s on the channel handed over at
//! registration time via [`CompletionProvider::subscribe`].

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tokio::sync::mpsc;

use crate::model::{FileUpdateKind, RequestKind};

/// Channel end a provider uses to deliver events to the broker.
pub type EventSender = mpsc::UnboundedSender<ProviderEvent>;

/// Events a provider emits toward the broker.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    /// The provider finished starting up and can accept traffic.
    Ready { provider: String },
    /// The provider produced an answer for a previously dispatched request.
    ResponseReady {
        provider: String,
        request_id: u64,
        payload: Value,
    },
}

/// Lifecycle status of a registered provider.
///
/// `Stopped → Running` happens only when the provider's own `Ready` event
/// arrives; `Running → Stopped` only through a global shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    Stopped,
    Running,
}

/// A completion/introspection backend.
///
/// All request/notification methods are fire-and-forget: the provider
/// queues work internally and returns; answers arrive as events.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Unique provider name; also the key in the priority policy.
    fn name(&self) -> &str;

    /// Hand the provider the channel it must emit events on. Called once,
    /// at registration time.
    fn subscribe(&self, events: EventSender);

    /// Begin starting up. Completion is signalled by a `Ready` event, not
    /// by this call returning.
    async fn start(&self);

    /// Stop synchronously.
    async fn shutdown(&self);

    /// Start support for `language`. Returns the provider's own success
    /// signal.
    async fn start_client(&self, language: &str) -> bool;

    /// Stop support for `language`.
    async fn stop_client(&self, language: &str);

    /// Forward a correlated request. The provider must echo `request_id`
    /// back in its `ResponseReady` event.
    async fn send_request(
        &self,
        language: &str,
        kind: RequestKind,
        params: &Value,
        request_id: u64,
    );

    /// Forward an uncorrelated notification for one language.
    async fn send_notification(&self, language: &str, kind: RequestKind, payload: &Value);

    /// Forward an uncorrelated notification that applies to every language.
    async fn broadcast_notification(&self, kind: RequestKind, payload: &Value);

    /// Tell the provider a project path was added or removed.
    async fn project_path_update(&self, path: &Path, update: FileUpdateKind);

    /// Associate an open file with the provider. `buffer` is an opaque,
    /// host-defined token (e.g. an editor buffer id).
    async fn register_file(&self, language: &str, filename: &Path, buffer: Value);
}
