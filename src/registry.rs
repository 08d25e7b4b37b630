// SPDX-License-Identifier: MIT
//! Provider registry — the set of registered providers, their lifecycle
//! status, and the fan-out helpers for lifecycle calls.
//!
//! Registration order is remembered; the merge uses it as the
//! deterministic iteration order over non-principal providers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{BrokerError, Result};
use crate::provider::{CompletionProvider, EventSender, ProviderStatus};

struct ProviderEntry {
    provider: Arc<dyn CompletionProvider>,
    status: ProviderStatus,
}

pub struct ProviderRegistry {
    entries: HashMap<String, ProviderEntry>,
    /// Provider names in registration order.
    order: Vec<String>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Add a provider with status `Stopped` and hand it the broker's event
    /// channel. Registering the same name twice is a configuration error.
    pub fn register(
        &mut self,
        provider: Arc<dyn CompletionProvider>,
        events: EventSender,
    ) -> Result<()> {
        let name = provider.name().to_string();
        if self.entries.contains_key(&name) {
            return Err(BrokerError::DuplicateProvider(name));
        }
        debug!(provider = %name, "registering completion provider");
        provider.subscribe(events);
        self.order.push(name.clone());
        self.entries.insert(
            name,
            ProviderEntry {
                provider,
                status: ProviderStatus::Stopped,
            },
        );
        Ok(())
    }

    /// Explicit named lookup (there is no implicit attribute forwarding).
    pub fn get(&self, name: &str) -> Option<Arc<dyn CompletionProvider>> {
        self.entries.get(name).map(|e| Arc::clone(&e.provider))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Names in registration order.
    pub fn registration_order(&self) -> &[String] {
        &self.order
    }

    /// `(name, status)` pairs in registration order.
    pub fn statuses(&self) -> Vec<(String, ProviderStatus)> {
        self.order
            .iter()
            .map(|name| (name.clone(), self.entries[name].status))
            .collect()
    }

    /// Running providers in registration order.
    pub fn running(&self) -> Vec<Arc<dyn CompletionProvider>> {
        self.order
            .iter()
            .filter_map(|name| {
                let entry = &self.entries[name];
                (entry.status == ProviderStatus::Running).then(|| Arc::clone(&entry.provider))
            })
            .collect()
    }

    /// Mark a provider `Running` after its `Ready` event. Idempotent; a
    /// ready event from an unregistered name is logged and ignored.
    pub fn on_ready(&mut self, name: &str) {
        match self.entries.get_mut(name) {
            Some(entry) => {
                if entry.status != ProviderStatus::Running {
                    debug!(provider = name, "provider is ready");
                    entry.status = ProviderStatus::Running;
                }
            }
            None => warn!(provider = name, "ready event from unregistered provider"),
        }
    }

    /// Ask every `Stopped` provider to begin starting up. The transition
    /// to `Running` happens only when its `Ready` event arrives.
    pub async fn start(&self) {
        for name in &self.order {
            let entry = &self.entries[name];
            if entry.status == ProviderStatus::Stopped {
                entry.provider.start().await;
            }
        }
    }

    /// Stop every `Running` provider; the status flips to `Stopped`
    /// synchronously.
    pub async fn shutdown(&mut self) {
        for name in &self.order {
            let entry = &self.entries[name];
            if entry.status == ProviderStatus::Running {
                entry.provider.shutdown().await;
            }
        }
        for entry in self.entries.values_mut() {
            if entry.status == ProviderStatus::Running {
                entry.status = ProviderStatus::Stopped;
            }
        }
    }

    /// Forward `start_client` to every running provider; true if at least
    /// one of them reported success.
    pub async fn start_client(&self, language: &str) -> bool {
        let mut started = false;
        for provider in self.running() {
            started |= provider.start_client(language).await;
        }
        started
    }

    /// Forward `stop_client` to every running provider.
    pub async fn stop_client(&self, language: &str) {
        for provider in self.running() {
            provider.stop_client(language).await;
        }
    }
}
