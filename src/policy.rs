// SPDX-License-Identifier: MIT
//! Priority policy — which provider's answer anchors the merge for each
//! request kind.
//!
//! Immutable after construction. Lookup never fails: kinds with no
//! specific entry fall back to the catch-all default principal.

use std::collections::HashMap;

use crate::model::RequestKind;

#[derive(Debug, Clone)]
pub struct PriorityPolicy {
    principals: HashMap<RequestKind, String>,
    default_principal: String,
}

impl PriorityPolicy {
    /// Create a policy whose catch-all principal is `default_principal`.
    pub fn new(default_principal: impl Into<String>) -> Self {
        Self {
            principals: HashMap::new(),
            default_principal: default_principal.into(),
        }
    }

    /// Designate `provider` as the principal for `kind`.
    pub fn with_principal(mut self, kind: RequestKind, provider: impl Into<String>) -> Self {
        self.principals.insert(kind, provider.into());
        self
    }

    /// The provider whose response triggers (and anchors) the merge for
    /// `kind`.
    pub fn principal_for(&self, kind: RequestKind) -> &str {
        self.principals
            .get(&kind)
            .map(String::as_str)
            .unwrap_or(&self.default_principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specific_entry_wins() {
        let policy = PriorityPolicy::new("lsp")
            .with_principal(RequestKind::DocumentCompletion, "lsp")
            .with_principal(RequestKind::DocumentHover, "fallback");
        assert_eq!(policy.principal_for(RequestKind::DocumentHover), "fallback");
    }

    #[test]
    fn unknown_kind_falls_back_to_default() {
        let policy =
            PriorityPolicy::new("lsp").with_principal(RequestKind::DocumentCompletion, "lsp");
        assert_eq!(policy.principal_for(RequestKind::DocumentSymbol), "lsp");
    }
}
