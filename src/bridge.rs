//! Event bridge between the host process and UI handlers.
//!
//! The host pushes named events; the bridge routes each to every handler
//! currently registered for that channel name. Registration is scoped:
//! [`subscribe`](EventBridge::subscribe) returns a [`Subscription`] handle
//! that removes exactly that handler when unsubscribed or dropped, so a UI
//! unit tears its handlers down deterministically on deactivation.
//!
//! Dispatch is synchronous and runs on the calling thread; a handler
//! panicking is isolated and logged, never aborting delivery to the
//! remaining handlers.

use std::{
    collections::HashMap,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use log::{debug, warn};
use serde_json::Value;

/// Callback invoked with the payload of a dispatched event.
pub type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

struct Entry {
    id: u64,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    channels: HashMap<String, Vec<Entry>>,
    next_id: u64,
}

/// Process-wide subscription registry.
///
/// Construct once at startup and pass by handle; clones share the same
/// registry. The bridge holds no UI state and is safe to keep alive for
/// the whole process lifetime.
#[derive(Clone, Default)]
pub struct EventBridge {
    inner: Arc<Mutex<Registry>>,
}

impl EventBridge {
    /// Create an empty bridge.
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a handler for a channel name.
    ///
    /// Multiple handlers may share one channel; all of them fire on each
    /// dispatch, in registration order. The returned [`Subscription`]
    /// removes exactly this handler, not others on the same channel.
    pub fn subscribe<F>(&self, channel: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let mut reg = self.registry();
        let id = reg.next_id;
        reg.next_id += 1;
        reg.channels.entry(channel.to_string()).or_default().push(Entry {
            id,
            handler: Arc::new(handler),
        });
        debug!("subscribed handler {id} on channel `{channel}`");
        Subscription {
            registry: Arc::downgrade(&self.inner),
            channel: channel.to_string(),
            id,
            active: true,
        }
    }

    /// Deliver a payload to every handler currently registered for
    /// `channel`, synchronously and in registration order.
    ///
    /// The handler list is snapshotted before invocation, so handlers may
    /// freely subscribe or unsubscribe during dispatch. A panicking
    /// handler is logged and skipped; the rest still run.
    ///
    /// Returns the number of handlers that completed without fault.
    pub fn dispatch(&self, channel: &str, payload: &Value) -> usize {
        let snapshot: Vec<(u64, Handler)> = self
            .registry()
            .channels
            .get(channel)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| (e.id, e.handler.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let mut delivered = 0;
        for (id, handler) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| handler(payload))) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    warn!("handler {id} on channel `{channel}` panicked; continuing dispatch");
                }
            }
        }
        delivered
    }

    /// Number of handlers currently registered for a channel.
    pub fn handler_count(&self, channel: &str) -> usize {
        self.registry()
            .channels
            .get(channel)
            .map_or(0, |entries| entries.len())
    }
}

/// Capability to remove one registered handler.
///
/// Unsubscribing is idempotent; dropping the handle unsubscribes as well,
/// tying handler lifetime to the owning UI unit.
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    channel: String,
    id: u64,
    active: bool,
}

impl Subscription {
    /// Remove the handler from the bridge. A second call is a no-op.
    pub fn unsubscribe(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut reg = registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entries) = reg.channels.get_mut(&self.channel) {
            entries.retain(|e| e.id != self.id);
            if entries.is_empty() {
                // Last handler gone: the channel returns to unregistered.
                reg.channels.remove(&self.channel);
            }
        }
        debug!("unsubscribed handler {} from channel `{}`", self.id, self.channel);
    }

    /// Whether the handler is still registered.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
