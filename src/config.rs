// SPDX-License-Identifier: MIT
//! Broker configuration.

use serde::Deserialize;

/// Tunables a host can set when constructing the broker.
///
/// The defaults replicate the historical behavior: an unbounded pending
/// map and a monotonically growing request counter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Upper bound on in-flight requests. `None` (the default) keeps the
    /// pending map unbounded; when set, the oldest pending request is
    /// evicted with a warning once the bound is reached, so a principal
    /// that never answers cannot leak tracker entries forever.
    pub max_pending: Option<usize>,
}
