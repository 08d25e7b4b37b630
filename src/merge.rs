// SPDX-License-Identifier: MIT
//! Response aggregator — collapses the per-provider responses accumulated
//! for one request into the single answer delivered to the caller.
//!
//! For completion requests the principal provider's item list is the base
//! result; every other provider may only contribute items whose
//! `insertText` is not already present, and those novel items get a run of
//! `'z'`s prefixed to their `sortText` so they order after the principal's
//! items (and after earlier providers' novel items). For any other request
//! kind the principal's payload is passed through verbatim and everything
//! else is discarded.
//!
//! Non-principal providers are visited in registration order. That order
//! is this crate's deterministic choice; only providers that actually
//! responded consume a priority level.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::model::{CompletionItem, RequestKind};

/// Merge the accumulated responses for one request.
///
/// The caller guarantees the principal's response is present in
/// `responses`; the merge fires only when the principal answers.
pub fn merge_responses(
    kind: RequestKind,
    responses: &HashMap<String, Value>,
    principal: &str,
    provider_order: &[String],
) -> Value {
    debug!(?kind, principal, "gathering provider responses");

    if kind != RequestKind::DocumentCompletion {
        return responses.get(principal).cloned().unwrap_or(Value::Null);
    }

    let mut merged = responses
        .get(principal)
        .map(|payload| completion_items(principal, payload))
        .unwrap_or_default();
    let mut seen: HashSet<String> = merged.iter().map(|i| i.insert_text.clone()).collect();

    let mut priority_level = 1usize;
    for provider in provider_order {
        if provider == principal {
            continue;
        }
        let Some(payload) = responses.get(provider) else {
            continue;
        };
        for mut item in completion_items(provider, payload) {
            if seen.contains(&item.insert_text) {
                continue;
            }
            item.sort_text = format!("{}{}", "z".repeat(priority_level + 1), item.sort_text);
            seen.insert(item.insert_text.clone());
            merged.push(item);
        }
        priority_level += 1;
    }

    json!({ "params": merged })
}

/// Pull the item list out of a completion payload (`{"params": [...]}`).
/// Malformed payloads contribute nothing.
fn completion_items(provider: &str, payload: &Value) -> Vec<CompletionItem> {
    match payload.get("params") {
        Some(params) => match serde_json::from_value(params.clone()) {
            Ok(items) => items,
            Err(e) => {
                warn!(provider, error = %e, "malformed completion items; ignoring");
                Vec::new()
            }
        },
        None => {
            warn!(provider, "completion payload missing `params`; ignoring");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn item(text: &str, sort: &str) -> Value {
        json!({ "insertText": text, "sortText": sort })
    }

    fn completion(items: Vec<Value>) -> Value {
        json!({ "params": items })
    }

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn merged_items(result: &Value) -> Vec<CompletionItem> {
        serde_json::from_value(result["params"].clone()).unwrap()
    }

    #[test]
    fn principal_version_wins_on_duplicate_insert_text() {
        let mut responses = HashMap::new();
        responses.insert("lsp".into(), completion(vec![item("foo", "a")]));
        responses.insert(
            "fallback".into(),
            completion(vec![item("foo", "b"), item("bar", "c")]),
        );
        let result = merge_responses(
            RequestKind::DocumentCompletion,
            &responses,
            "lsp",
            &order(&["lsp", "fallback"]),
        );
        let items = merged_items(&result);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].insert_text, "foo");
        assert_eq!(items[0].sort_text, "a", "principal item keeps its sort key");
        assert_eq!(items[1].insert_text, "bar");
        assert_eq!(items[1].sort_text, "zzc");
    }

    #[test]
    fn priority_levels_grow_per_extra_provider() {
        let mut responses = HashMap::new();
        responses.insert("lsp".into(), completion(vec![item("base", "0")]));
        responses.insert("kite".into(), completion(vec![item("first", "k")]));
        responses.insert("fallback".into(), completion(vec![item("second", "f")]));
        let result = merge_responses(
            RequestKind::DocumentCompletion,
            &responses,
            "lsp",
            &order(&["lsp", "kite", "fallback"]),
        );
        let items = merged_items(&result);
        assert_eq!(items[1].sort_text, "zzk", "first extra provider: two z's");
        assert_eq!(items[2].sort_text, "zzzf", "second extra provider: three z's");
    }

    #[test]
    fn non_responding_provider_consumes_no_priority_level() {
        let mut responses = HashMap::new();
        responses.insert("lsp".into(), completion(vec![]));
        responses.insert("fallback".into(), completion(vec![item("only", "s")]));
        // "kite" is registered between lsp and fallback but never answered.
        let result = merge_responses(
            RequestKind::DocumentCompletion,
            &responses,
            "lsp",
            &order(&["lsp", "kite", "fallback"]),
        );
        assert_eq!(merged_items(&result)[0].sort_text, "zzs");
    }

    #[test]
    fn non_completion_kind_is_principal_passthrough() {
        let mut responses = HashMap::new();
        responses.insert("lsp".into(), json!({ "params": { "signatures": [1, 2] } }));
        responses.insert("fallback".into(), json!({ "params": { "signatures": [9] } }));
        let result = merge_responses(
            RequestKind::DocumentSignature,
            &responses,
            "lsp",
            &order(&["lsp", "fallback"]),
        );
        assert_eq!(result, json!({ "params": { "signatures": [1, 2] } }));
    }

    #[test]
    fn extra_item_fields_survive_the_merge() {
        let mut responses = HashMap::new();
        responses.insert("lsp".into(), completion(vec![]));
        responses.insert(
            "fallback".into(),
            completion(vec![json!({
                "insertText": "spam",
                "sortText": "s",
                "detail": "from fallback",
                "kind": 14
            })]),
        );
        let result = merge_responses(
            RequestKind::DocumentCompletion,
            &responses,
            "lsp",
            &order(&["lsp", "fallback"]),
        );
        let items = merged_items(&result);
        assert_eq!(items[0].extra["detail"], json!("from fallback"));
        assert_eq!(items[0].extra["kind"], json!(14));
    }

    #[test]
    fn malformed_non_principal_payload_contributes_nothing() {
        let mut responses = HashMap::new();
        responses.insert("lsp".into(), completion(vec![item("ok", "a")]));
        responses.insert("fallback".into(), json!({ "params": "not-a-list" }));
        let result = merge_responses(
            RequestKind::DocumentCompletion,
            &responses,
            "lsp",
            &order(&["lsp", "fallback"]),
        );
        assert_eq!(merged_items(&result).len(), 1);
    }

    proptest! {
        /// Every insertText appears at most once in the merged list, and
        /// the principal's items always come first with untouched keys.
        #[test]
        fn merged_insert_texts_are_unique(
            principal_texts in proptest::collection::vec("[a-c]{1,2}", 0..5),
            extra_texts in proptest::collection::vec("[a-e]{1,2}", 0..5),
        ) {
            let mut responses = HashMap::new();
            responses.insert(
                "lsp".to_string(),
                completion(principal_texts.iter().map(|t| item(t, "p")).collect()),
            );
            responses.insert(
                "fallback".to_string(),
                completion(extra_texts.iter().map(|t| item(t, "e")).collect()),
            );
            let result = merge_responses(
                RequestKind::DocumentCompletion,
                &responses,
                "lsp",
                &order(&["lsp", "fallback"]),
            );
            let items = merged_items(&result);
            let texts: Vec<_> = items.iter().map(|i| i.insert_text.clone()).collect();
            let unique: HashSet<_> = texts.iter().cloned().collect();
            // Principal duplicates are kept as-is (base list is verbatim),
            // so uniqueness is asserted over what the extras added.
            let extras_added = items.iter().filter(|i| i.sort_text.starts_with("zz")).count();
            let principal_kept = items.len() - extras_added;
            prop_assert_eq!(principal_kept, principal_texts.len());
            for added in items.iter().filter(|i| i.sort_text.starts_with("zz")) {
                prop_assert!(!principal_texts.contains(&added.insert_text));
            }
            prop_assert!(unique.len() <= texts.len());
        }
    }
}
