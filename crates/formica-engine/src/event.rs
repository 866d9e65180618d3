//! Visual-update notifications.
//!
//! The engine fires one [`VisualUpdate`] per added or removed upgrade and
//! delivers it synchronously, before the mutating call returns. Listeners are
//! read-only: they receive the update by reference and cannot reach back into
//! the engine.
//!
//! Delivery order is `(priority, registration order)`. A listener registered
//! with a filter only sees updates the filter accepts.

use formica_core::id::TechId;
use formica_effects::VisualDeltas;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Update payload
// ---------------------------------------------------------------------------

/// Whether the node's cosmetic contribution was added or taken away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualUpdateKind {
    Applied,
    Reverted,
}

/// One upgrade's cosmetic change, for animation and rendering collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualUpdate {
    /// The upgrade that was added or removed.
    pub tech_id: TechId,
    pub kind: VisualUpdateKind,
    /// The node's own `visual_changes`.
    pub changes: VisualDeltas,
    /// Cosmetics composed across the whole active set after the change.
    pub composed: VisualDeltas,
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// Receives visual updates read-only.
pub type VisualListener = Box<dyn FnMut(&VisualUpdate)>;

/// Optional predicate that filters updates for a listener.
pub type VisualFilter = Box<dyn Fn(&VisualUpdate) -> bool>;

/// Priority level for listeners. Lower priorities run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SubscriberPriority {
    Pre = 0,
    #[default]
    Normal = 1,
    Post = 2,
}

/// Handle returned by [`VisualUpdateBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct SubscriberEntry {
    id: SubscriptionId,
    listener: VisualListener,
    priority: SubscriberPriority,
    filter: Option<VisualFilter>,
}

impl std::fmt::Debug for SubscriberEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberEntry")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field(
                "filter",
                &if self.filter.is_some() {
                    "Some(<fn>)"
                } else {
                    "None"
                },
            )
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// VisualUpdateBus
// ---------------------------------------------------------------------------

/// Engine-owned listener list.
#[derive(Debug, Default)]
pub struct VisualUpdateBus {
    /// Kept sorted by `(priority, id)`; ids increase with registration.
    subscribers: Vec<SubscriberEntry>,
    next_id: u64,
    total_emitted: u64,
}

impl VisualUpdateBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener with normal priority and no filter.
    pub fn on_update(&mut self, listener: VisualListener) -> SubscriptionId {
        self.subscribe(SubscriberPriority::Normal, None, listener)
    }

    /// Register a listener with explicit priority and optional filter.
    pub fn subscribe(
        &mut self,
        priority: SubscriberPriority,
        filter: Option<VisualFilter>,
        listener: VisualListener,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let entry = SubscriberEntry {
            id,
            listener,
            priority,
            filter,
        };
        let at = self
            .subscribers
            .partition_point(|e| (e.priority, e.id) < (priority, id));
        self.subscribers.insert(at, entry);
        id
    }

    /// Remove a listener. Returns `false` if the id was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|e| e.id != id);
        self.subscribers.len() != before
    }

    /// Deliver `update` to every listener whose filter accepts it.
    pub fn emit(&mut self, update: &VisualUpdate) {
        self.total_emitted += 1;
        for entry in &mut self.subscribers {
            if let Some(ref filter) = entry.filter
                && !filter(update)
            {
                continue;
            }
            (entry.listener)(update);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Updates emitted since creation, delivered or not.
    pub fn total_emitted(&self) -> u64 {
        self.total_emitted
    }
}

// ===========================================================================
// Tests
// ===========================================================================
