// SPDX-License-Identifier: MIT
//! combroker — a completion-request broker.
//!
//! Fans a single logical completion/introspection request out to several
//! independent backend providers (a language-server client, a heuristic
//! fallback engine, …), correlates their asynchronous responses by request
//! id, merges them under a deterministic priority policy, and delivers
//! exactly one consolidated answer to the original caller.
//!
//! The broker owns dispatch, correlation, and merge only. Providers — the
//! actual transports and completion engines — live outside this crate and
//! plug in through the [`provider::CompletionProvider`] trait, emitting
//! [`provider::ProviderEvent`]s on the channel they receive at
//! registration time.

pub mod broker;
pub mod config;
pub mod error;
pub mod merge;
pub mod model;
pub mod policy;
pub mod provider;
pub mod registry;
pub mod tracker;

pub use broker::CompletionBroker;
pub use config::BrokerConfig;
pub use error::{BrokerError, Result};
pub use model::{CompletionItem, DispatchRequest, FileUpdateKind, RequestKind, ResponseHandler};
pub use policy::PriorityPolicy;
pub use provider::{CompletionProvider, EventSender, ProviderEvent, ProviderStatus};
