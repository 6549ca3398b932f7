//! # confform
//!
//! A Cursive-based form library for hierarchical application settings,
//! with an event bridge routing host-pushed events into dialogs and
//! notifications.
//!
//! ## Features
//!
//! - Recursive, typed settings tree with point lookup, point mutation,
//!   and dirty tracking
//! - Form generation: each field kind maps to exactly one editable
//!   [Cursive](https://github.com/gyscos/cursive) control, wired straight
//!   back into the tree
//! - Process-wide event bridge with scoped, idempotent subscriptions and
//!   per-handler fault isolation
//! - Notification router turning host events into messages,
//!   notifications, or modals
//! - Pluggable persistence boundary with a TOML/JSON file store
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use confform::{
//!     bridge::EventBridge,
//!     data::ConfigTree,
//!     notify::NotificationRouter,
//!     store::{FileStore, SettingsStore},
//!     ui,
//! };
//!
//! # fn main() -> anyhow::Result<()> {
//! let store = Arc::new(FileStore::new("settings.json"));
//! let tree = ConfigTree::new(store.load()?);
//!
//! let bridge = EventBridge::new();
//! let mut siv = cursive::default();
//! let router = NotificationRouter::attach(&bridge, siv.cb_sink().clone());
//!
//! ui::open_form(&mut siv, tree, store);
//! siv.run();
//! drop(router);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`data`] - Configuration tree model and services
//! - [`bridge`] - Host event bridge and subscription registry
//! - [`notify`] - Notification router and envelopes
//! - [`store`] - Persistence boundary
//! - [`ui`] - Form building and field editors

/// Host event bridge and subscription registry.
pub mod bridge;

/// Configuration data structures and tree services.
pub mod data;

/// Error taxonomy.
pub mod error;

/// Notification router and event envelopes.
pub mod notify;

/// Persistence boundary and file-backed store.
pub mod store;

/// UI components and field editors.
pub mod ui;

pub use bridge::{EventBridge, Subscription};
pub use data::{ConfigNode, ConfigTree, FieldKind, FieldOption};
pub use error::ConfigError;
pub use notify::{MessageEnvelope, MessageKind, ModalRequest, NotificationRouter};
pub use store::{FileStore, SaveReply, SettingsStore};

pub use cursive;
pub use serde_json::Value;
