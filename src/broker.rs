// SPDX-License-Identifier: MIT
//! The broker façade — dispatches requests and notifications to every
//! running provider, correlates their asynchronous responses by request
//! id, and delivers exactly one merged answer per response-requiring
//! dispatch.
//!
//! All mutable state (registry + tracker) sits behind a single mutex, so
//! every entry point — host calls and provider events alike — executes
//! serially. Providers may emit events from any task or thread; they go
//! through an mpsc channel and reach the broker one at a time. The broker
//! itself never blocks on a provider answering: dispatch is fire-and-forget
//! and completion is observed only through `ResponseReady` events. The
//! merged answer is handed to the caller outside the state lock, so a
//! handler may call straight back into the broker.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::BrokerConfig;
use crate::error::Result;
use crate::merge::merge_responses;
use crate::model::{DispatchRequest, FileUpdateKind, RequestKind};
use crate::policy::PriorityPolicy;
use crate::provider::{CompletionProvider, EventSender, ProviderEvent, ProviderStatus};
use crate::registry::ProviderRegistry;
use crate::tracker::RequestTracker;

/// Reserved: how long a host might reasonably wait for a merged answer
/// before giving up. The broker enforces no timeout itself — a principal
/// that never responds leaves the request pending — so hosts that need an
/// upper bound apply their own above this core.
pub const WAITING_TIME_MS: u64 = 1_000;

struct BrokerState {
    registry: ProviderRegistry,
    tracker: RequestTracker,
}

pub struct CompletionBroker {
    state: Mutex<BrokerState>,
    policy: PriorityPolicy,
    events_tx: EventSender,
    /// Taken by [`spawn_event_loop`](Self::spawn_event_loop); `None` once
    /// the loop is running.
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<ProviderEvent>>>,
}

impl CompletionBroker {
    pub fn new(policy: PriorityPolicy) -> Self {
        Self::with_config(policy, BrokerConfig::default())
    }

    pub fn with_config(policy: PriorityPolicy, config: BrokerConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            state: Mutex::new(BrokerState {
                registry: ProviderRegistry::new(),
                tracker: RequestTracker::new(config.max_pending),
            }),
            policy,
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    // ─── Registration & lifecycle ─────────────────────────────────────────────

    /// Register a provider. It starts out `Stopped` and is handed the
    /// broker's event channel.
    pub async fn register_provider(&self, provider: Arc<dyn CompletionProvider>) -> Result<()> {
        let mut state = self.state.lock().await;
        state.registry.register(provider, self.events_tx.clone())
    }

    /// Ask every stopped provider to start. Each becomes `Running` only
    /// once its own `Ready` event arrives.
    pub async fn start(&self) {
        self.state.lock().await.registry.start().await;
    }

    /// Stop every running provider.
    pub async fn shutdown(&self) {
        self.state.lock().await.registry.shutdown().await;
    }

    /// Start language support on all running providers; true if at least
    /// one succeeded.
    pub async fn start_client(&self, language: &str) -> bool {
        self.state.lock().await.registry.start_client(language).await
    }

    /// Stop language support on all running providers.
    pub async fn stop_client(&self, language: &str) {
        self.state.lock().await.registry.stop_client(language).await;
    }

    /// Look up a registered provider's handle by name.
    pub async fn get_provider(&self, name: &str) -> Option<Arc<dyn CompletionProvider>> {
        self.state.lock().await.registry.get(name)
    }

    /// `(name, status)` for every registered provider, in registration
    /// order.
    pub async fn provider_statuses(&self) -> Vec<(String, ProviderStatus)> {
        self.state.lock().await.registry.statuses()
    }

    /// Number of requests still waiting on their principal.
    pub async fn pending_requests(&self) -> usize {
        self.state.lock().await.tracker.len()
    }

    // ─── Dispatch & fan-out ───────────────────────────────────────────────────

    /// Fan a correlated request out to every running provider.
    ///
    /// With zero running providers nothing is tracked and no callback will
    /// ever fire. The request counter advances only when the caller asked
    /// for a response; fire-and-forget dispatches share their id with the
    /// next response-requiring one (historical id-reuse semantics,
    /// preserved deliberately).
    pub async fn dispatch(&self, language: &str, kind: RequestKind, request: DispatchRequest) {
        let DispatchRequest {
            params,
            handler,
            requires_response,
        } = request;

        let mut state = self.state.lock().await;
        let id = state.tracker.current_id();
        let running = state.registry.running();
        if running.is_empty() {
            debug!(?kind, language, "no running providers; request not dispatched");
        } else {
            debug!(
                request_id = id,
                ?kind,
                language,
                providers = running.len(),
                "dispatching request"
            );
            for provider in &running {
                state
                    .tracker
                    .track(id, kind, language, Arc::clone(&handler), provider.name());
                provider.send_request(language, kind, &params, id).await;
            }
        }
        // Advances even when zero providers were asked.
        if requires_response {
            state.tracker.advance();
        }
    }

    /// Fire an uncorrelated notification to every running provider.
    pub async fn notify(&self, language: &str, kind: RequestKind, payload: &Value) {
        let state = self.state.lock().await;
        for provider in state.registry.running() {
            provider.send_notification(language, kind, payload).await;
        }
    }

    /// Fire an uncorrelated notification that applies to every language.
    pub async fn broadcast(&self, kind: RequestKind, payload: &Value) {
        let state = self.state.lock().await;
        for provider in state.registry.running() {
            provider.broadcast_notification(kind, payload).await;
        }
    }

    /// Tell every running provider a project path was added or removed.
    pub async fn project_path_update(&self, path: &Path, update: FileUpdateKind) {
        let state = self.state.lock().await;
        for provider in state.registry.running() {
            provider.project_path_update(path, update).await;
        }
    }

    /// Associate an open file with every running provider.
    pub async fn register_file(&self, language: &str, filename: &Path, buffer: Value) {
        let state = self.state.lock().await;
        for provider in state.registry.running() {
            provider
                .register_file(language, filename, buffer.clone())
                .await;
        }
    }

    // ─── Event handling ───────────────────────────────────────────────────────

    /// Process one provider event. This is the single serialized entry
    /// point for readiness and response events; hosts that run their own
    /// event loop call it directly, everyone else uses
    /// [`spawn_event_loop`](Self::spawn_event_loop).
    pub async fn handle_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::Ready { provider } => {
                self.state.lock().await.registry.on_ready(&provider);
            }
            ProviderEvent::ResponseReady {
                provider,
                request_id,
                payload,
            } => {
                self.on_response(&provider, request_id, payload).await;
            }
        }
    }

    /// Pump provider events into [`handle_event`](Self::handle_event) on a
    /// background task. Returns `None` if the loop was already spawned.
    pub async fn spawn_event_loop(self: Arc<Self>) -> Option<JoinHandle<()>> {
        let mut rx = self.events_rx.lock().await.take()?;
        let broker = Arc::clone(&self);
        Some(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                broker.handle_event(event).await;
            }
            debug!("provider event channel closed; event loop exiting");
        }))
    }

    /// Record a provider's response; if the responder is the principal for
    /// this request's kind, merge everything accumulated so far and invoke
    /// the caller's handler exactly once.
    async fn on_response(&self, provider: &str, request_id: u64, payload: Value) {
        let mut state = self.state.lock().await;
        debug!(request_id, provider, "got provider response");

        let kind = match state.tracker.record_response(request_id, provider, payload) {
            Ok(kind) => kind,
            Err(e) => {
                warn!(request_id, provider, error = %e, "dropping stray provider response");
                return;
            }
        };

        let principal = self.policy.principal_for(kind);
        if !state.registry.contains(principal) {
            warn!(
                request_id,
                principal,
                "priority policy names an unregistered principal; merge cannot complete"
            );
            return;
        }
        if provider != principal {
            // Buffered. Counted in only if the principal has not answered
            // by the time it does.
            return;
        }

        let provider_order = state.registry.registration_order().to_vec();
        let Some(pending) = state.tracker.retire(request_id) else {
            // record_response just succeeded, so the entry must exist.
            return;
        };
        let merged = merge_responses(kind, &pending.responses, principal, &provider_order);
        drop(state);

        pending.handler.handle_response(kind, merged);
    }
}
