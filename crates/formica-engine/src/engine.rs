use crate::config::EngineConfig;
use crate::event::{
    SubscriberPriority, SubscriptionId, VisualFilter, VisualListener, VisualUpdate,
    VisualUpdateBus, VisualUpdateKind,
};
use crate::serialize::UpgradeState;
use formica_core::clock::{Clock, SystemClock};
use formica_core::fixed::Fixed64;
use formica_core::id::{ColonyId, TechId};
use formica_effects::{
    AntAttributes, CombatStats, CumulativeEffects, EffectCache, ResourceKind, VisualDeltas,
    aggregate, apply_ant_modifiers, apply_combat_modifiers, apply_construction_modifiers,
    apply_resource_modifiers, compose_visuals,
};
use formica_tech_tree::{
    LayoutConfig, NodePlacement, TechCatalog, TechnologyNode, UnlockStatus, classify,
    classify_all, compute_tiers, group_by_tier, layout_tiers,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("upgrade engine not initialized for a colony")]
    NotInitialized,
    #[error("unknown technology: {0}")]
    UnknownTechnology(TechId),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One colony's active upgrades. Replaced wholesale on initialize/import.
#[derive(Debug)]
struct Session {
    colony_id: ColonyId,
    active: BTreeMap<TechId, TechnologyNode>,
}

// ---------------------------------------------------------------------------
// UpgradeEngine
// ---------------------------------------------------------------------------

/// The upgrade lifecycle controller.
///
/// Owns the catalog, the active upgrade set of the current colony, the
/// effect cache and the visual-update listeners. Every operation runs to
/// completion before returning: a mutation invalidates the cache, recomputes
/// the cumulative record and notifies listeners, in that order.
///
/// Operations that need a colony return [`EngineError::NotInitialized`]
/// until [`initialize`](Self::initialize) or
/// [`import_state`](Self::import_state) has run.
#[derive(Debug)]
pub struct UpgradeEngine<C: Clock = SystemClock> {
    catalog: TechCatalog,
    config: EngineConfig,
    clock: C,
    session: Option<Session>,
    cache: EffectCache,
    visual_bus: VisualUpdateBus,
}

impl UpgradeEngine<SystemClock> {
    pub fn new(catalog: TechCatalog, config: EngineConfig) -> Self {
        Self::with_clock(catalog, config, SystemClock)
    }
}

impl<C: Clock> UpgradeEngine<C> {
    /// Create an engine reading time from `clock`.
    pub fn with_clock(catalog: TechCatalog, config: EngineConfig, clock: C) -> Self {
        Self {
            catalog,
            cache: EffectCache::new(config.cache_ttl_ms),
            config,
            clock,
            session: None,
            visual_bus: VisualUpdateBus::new(),
        }
    }

    pub fn catalog(&self) -> &TechCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Start a session for `colony_id` with its previously unlocked upgrades.
    ///
    /// Discards any prior session. Ids missing from the catalog are skipped.
    /// No visual updates are fired.
    pub fn initialize<I, T>(&mut self, colony_id: impl Into<ColonyId>, unlocked: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<TechId>,
    {
        let colony_id = colony_id.into();
        let mut active = BTreeMap::new();
        for id in unlocked {
            let id = id.into();
            match self.catalog.get(&id) {
                Some(node) => {
                    active.insert(id, node.clone());
                }
                None => warn!(%colony_id, tech = %id, "skipping unknown technology on initialize"),
            }
        }
        debug!(%colony_id, active = active.len(), "upgrade session initialized");
        self.session = Some(Session { colony_id, active });
        self.recompute("initialize");
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    pub fn colony_id(&self) -> Option<&ColonyId> {
        self.session.as_ref().map(|s| &s.colony_id)
    }

    /// Active upgrade ids in ascending order. Empty before initialize.
    pub fn active_ids(&self) -> impl Iterator<Item = &TechId> {
        self.session.iter().flat_map(|s| s.active.keys())
    }

    /// Active upgrade nodes in ascending id order. Empty before initialize.
    pub fn active_upgrades(&self) -> impl Iterator<Item = &TechnologyNode> {
        self.session.iter().flat_map(|s| s.active.values())
    }

    pub fn is_active(&self, id: &TechId) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.active.contains_key(id))
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Activate `node`, replacing any entry with the same id.
    ///
    /// Callers invoke this only after the purchase has been validated
    /// elsewhere; no eligibility check is made here.
    pub fn add_upgrade(&mut self, node: TechnologyNode) -> Result<(), EngineError> {
        let session = self.session.as_mut().ok_or(EngineError::NotInitialized)?;
        let tech_id = node.id.clone();
        let changes = node.visual_changes.clone();
        if session.active.insert(tech_id.clone(), node).is_some() {
            debug!(tech = %tech_id, "replaced active upgrade");
        } else {
            debug!(tech = %tech_id, "added upgrade");
        }
        self.recompute("add");
        self.notify(tech_id, VisualUpdateKind::Applied, changes);
        Ok(())
    }

    /// Activate the catalog node `id`. Returns `Ok(false)` and logs when the
    /// id is not in the catalog.
    pub fn add_upgrade_by_id(&mut self, id: &TechId) -> Result<bool, EngineError> {
        if self.session.is_none() {
            return Err(EngineError::NotInitialized);
        }
        let Some(node) = self.catalog.get(id).cloned() else {
            warn!(tech = %id, "cannot add unknown technology");
            return Ok(false);
        };
        self.add_upgrade(node)?;
        Ok(true)
    }

    /// Classify `id` against the active set and activate it when it is
    /// [`UnlockStatus::Available`]. Returns the status before the purchase.
    pub fn purchase(&mut self, id: &TechId, points_balance: u32) -> Result<UnlockStatus, EngineError> {
        let status = self.status_of(id, points_balance)?;
        if status.can_purchase() {
            self.add_upgrade_by_id(id)?;
        } else {
            debug!(tech = %id, %status, "purchase refused");
        }
        Ok(status)
    }

    /// Deactivate `id` (undo). Returns whether anything was removed; an
    /// inactive id is a no-op with no notification.
    pub fn remove_upgrade(&mut self, id: &TechId) -> Result<bool, EngineError> {
        let session = self.session.as_mut().ok_or(EngineError::NotInitialized)?;
        let Some(node) = session.active.remove(id) else {
            return Ok(false);
        };
        debug!(tech = %id, "removed upgrade");
        self.recompute("remove");
        self.notify(node.id, VisualUpdateKind::Reverted, node.visual_changes);
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Export / import
    // -----------------------------------------------------------------------

    pub fn export_state(&self) -> Result<UpgradeState, EngineError> {
        let session = self.session.as_ref().ok_or(EngineError::NotInitialized)?;
        Ok(UpgradeState {
            colony_id: session.colony_id.clone(),
            active_upgrades: session
                .active
                .iter()
                .map(|(id, node)| (id.clone(), node.clone()))
                .collect(),
            last_cache_timestamp: self.cache.computed_at(),
        })
    }

    /// Replace all state with `state` and recompute. The imported cache
    /// timestamp is ignored. No visual updates are fired.
    ///
    /// Entries are keyed by the node's own id; a pair whose key disagrees
    /// with its node is logged and stored under the node's id.
    pub fn import_state(&mut self, state: UpgradeState) {
        let UpgradeState {
            colony_id,
            active_upgrades,
            last_cache_timestamp,
        } = state;
        let mut active = BTreeMap::new();
        for (key, node) in active_upgrades {
            if key != node.id {
                warn!(%colony_id, %key, tech = %node.id, "snapshot entry keyed under another id");
            }
            active.insert(node.id.clone(), node);
        }
        debug!(
            %colony_id,
            active = active.len(),
            ?last_cache_timestamp,
            "upgrade session imported"
        );
        self.session = Some(Session { colony_id, active });
        self.recompute("import");
    }

    // -----------------------------------------------------------------------
    // Eligibility and layout
    // -----------------------------------------------------------------------

    /// Eligibility of catalog node `id` for the current colony.
    pub fn status_of(&self, id: &TechId, points_balance: u32) -> Result<UnlockStatus, EngineError> {
        let session = self.session.as_ref().ok_or(EngineError::NotInitialized)?;
        let node = self
            .catalog
            .get(id)
            .ok_or_else(|| EngineError::UnknownTechnology(id.clone()))?;
        Ok(classify(node, &session.active, points_balance))
    }

    /// Eligibility of every catalog node, in catalog order.
    pub fn statuses(&self, points_balance: u32) -> Result<Vec<(TechId, UnlockStatus)>, EngineError> {
        let session = self.session.as_ref().ok_or(EngineError::NotInitialized)?;
        Ok(classify_all(&self.catalog, &session.active, points_balance))
    }

    /// Tiered slot positions for the whole catalog.
    pub fn tier_layout(&self, layout: &LayoutConfig) -> Vec<NodePlacement> {
        let nodes = self.catalog.nodes();
        let tiers = compute_tiers(nodes);
        layout_tiers(&group_by_tier(nodes, &tiers), layout)
    }

    // -----------------------------------------------------------------------
    // Effects
    // -----------------------------------------------------------------------

    /// The cumulative record, recomputed if the cached one has expired.
    pub fn current_effects(&mut self) -> Result<&CumulativeEffects, EngineError> {
        let session = self.session.as_ref().ok_or(EngineError::NotInitialized)?;
        let now = self.clock.now_millis();
        Ok(self.cache.get_or_recompute(now, || {
            debug!(reason = "expired", "recomputing cumulative effects");
            aggregate(session.active.values())
        }))
    }

    pub fn apply_ant_modifiers(&mut self, base: &AntAttributes) -> Result<AntAttributes, EngineError> {
        let modifiers = self.config.modifiers;
        Ok(apply_ant_modifiers(self.current_effects()?, base, &modifiers))
    }

    pub fn apply_resource_modifiers(
        &mut self,
        kind: ResourceKind,
        rate: Fixed64,
    ) -> Result<Fixed64, EngineError> {
        Ok(apply_resource_modifiers(self.current_effects()?, kind, rate))
    }

    pub fn apply_construction_modifiers(&mut self, base_duration: u64) -> Result<u64, EngineError> {
        let modifiers = self.config.modifiers;
        Ok(apply_construction_modifiers(
            self.current_effects()?,
            base_duration,
            &modifiers,
        ))
    }

    pub fn apply_combat_modifiers(&mut self, base: &CombatStats) -> Result<CombatStats, EngineError> {
        let modifiers = self.config.modifiers;
        Ok(apply_combat_modifiers(self.current_effects()?, base, &modifiers))
    }

    pub fn has_special_ability(&mut self, name: &str) -> Result<bool, EngineError> {
        Ok(self.current_effects()?.has_special_ability(name))
    }

    pub fn research_speed_modifier(&mut self) -> Result<Fixed64, EngineError> {
        Ok(self.current_effects()?.research_speed_modifier())
    }

    pub fn colony_happiness_modifier(&mut self) -> Result<Fixed64, EngineError> {
        Ok(self.current_effects()?.colony_happiness_modifier())
    }

    /// Cosmetics composed across the active set. Empty before initialize.
    pub fn composed_visuals(&self) -> VisualDeltas {
        compose_visuals(self.active_upgrades())
    }

    // -----------------------------------------------------------------------
    // Visual-update listeners
    // -----------------------------------------------------------------------

    /// Register a listener with normal priority and no filter.
    pub fn on_visual_update(&mut self, listener: VisualListener) -> SubscriptionId {
        self.visual_bus.on_update(listener)
    }

    pub fn subscribe(
        &mut self,
        priority: SubscriberPriority,
        filter: Option<VisualFilter>,
        listener: VisualListener,
    ) -> SubscriptionId {
        self.visual_bus.subscribe(priority, filter, listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.visual_bus.unsubscribe(id)
    }

    pub fn visual_updates_emitted(&self) -> u64 {
        self.visual_bus.total_emitted()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn recompute(&mut self, reason: &'static str) {
        self.cache.invalidate();
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let now = self.clock.now_millis();
        self.cache.store(aggregate(session.active.values()), now);
        debug!(reason, at = now, "recomputed cumulative effects");
    }

    fn notify(&mut self, tech_id: TechId, kind: VisualUpdateKind, changes: VisualDeltas) {
        let update = VisualUpdate {
            tech_id,
            kind,
            changes,
            composed: self.composed_visuals(),
        };
        self.visual_bus.emit(&update);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
