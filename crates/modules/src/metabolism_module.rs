// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metabolism Module: wires the Metabolism Engine and Effect Diff Detector
//! into the scheduler, and flushes every tracked player's stats to the
//! Persistence Sink on shutdown.

use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use livingworld_core::ModuleId;
use livingworld_engine::{
    ActivitySnapshot, EffectDiffDetector, GameModule, MetabolismEngine, ModuleContext, ModuleError, PlayerMetabolismData, Scheduler,
    TaskHandle,
};
use livingworld_host::{AssetMap, CreativeMode, EffectController, MovementStates};
use livingworld_storage::{DocumentId, FileDocumentStore};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

const SLOW_TICK_INTERVAL: Duration = Duration::from_secs(1);
/// Effect-diff + restoration tick: fast enough to catch an instant-heal
/// effect that the host only reports active for ~100ms.
const FAST_TICK_INTERVAL: Duration = Duration::from_millis(50);

/// What actually reaches disk for one player's metabolism state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlayerMetabolismDocument {
    #[serde(default = "full")]
    pub hunger: f64,
    #[serde(default = "full")]
    pub thirst: f64,
    #[serde(default = "full")]
    pub energy: f64,
}

fn full() -> f64 {
    100.0
}

impl From<&PlayerMetabolismData> for PlayerMetabolismDocument {
    fn from(data: &PlayerMetabolismData) -> Self {
        Self { hunger: data.hunger, thirst: data.thirst, energy: data.energy }
    }
}

pub struct MetabolismModule {
    id: ModuleId,
    deps: HashSet<ModuleId>,
    metabolism: Arc<MetabolismEngine>,
    effects: Arc<Mutex<EffectDiffDetector>>,
    assets: Arc<dyn AssetMap>,
    effect_controller: Arc<dyn EffectController>,
    scheduler: Arc<Scheduler>,
    store: FileDocumentStore,
    slow_tick_handle: Mutex<Option<TaskHandle>>,
    fast_tick_handle: Mutex<Option<TaskHandle>>,
}

impl MetabolismModule {
    pub fn new(
        metabolism: Arc<MetabolismEngine>,
        effects: Arc<Mutex<EffectDiffDetector>>,
        assets: Arc<dyn AssetMap>,
        effect_controller: Arc<dyn EffectController>,
        scheduler: Arc<Scheduler>,
        store_root: impl Into<std::path::PathBuf>,
    ) -> Self {
        Self {
            id: ModuleId::new("metabolism"),
            deps: HashSet::new(),
            metabolism,
            effects,
            assets,
            effect_controller,
            scheduler,
            store: FileDocumentStore::new(store_root.into()),
            slow_tick_handle: Mutex::new(None),
            fast_tick_handle: Mutex::new(None),
        }
    }

    pub fn metabolism(&self) -> &Arc<MetabolismEngine> {
        &self.metabolism
    }

    pub fn effects(&self) -> &Arc<Mutex<EffectDiffDetector>> {
        &self.effects
    }

    fn flush(&self, ctx: &ModuleContext) {
        ctx.sessions.for_each(|session| {
            let player_id = session.player_id();
            if let Some(data) = self.metabolism.snapshot(player_id) {
                let id = DocumentId::new("playerdata", player_id.as_uuid().to_string());
                let doc = PlayerMetabolismDocument::from(&data);
                if let Err(err) = self.store.save(&id, &doc) {
                    tracing::warn!(player = %player_id, error = %err, "metabolism flush failed for this player");
                }
            }
        });
    }
}

impl GameModule for MetabolismModule {
    fn id(&self) -> &ModuleId {
        &self.id
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn display_name(&self) -> &str {
        "Metabolism"
    }

    fn dependencies(&self) -> &HashSet<ModuleId> {
        &self.deps
    }

    fn on_setup(&self, _ctx: &ModuleContext) -> Result<(), ModuleError> {
        Ok(())
    }

    fn on_start(&self, ctx: &ModuleContext) -> Result<(), ModuleError> {
        let fast_metabolism = Arc::clone(&self.metabolism);
        let fast_effects = Arc::clone(&self.effects);
        let assets = Arc::clone(&self.assets);
        let effect_controller = Arc::clone(&self.effect_controller);
        let fast_sessions = Arc::clone(&ctx.sessions);
        let fast_handle = self.scheduler.schedule_periodic("metabolism-fast-tick", FAST_TICK_INTERVAL, move || {
            let now = crate::now_ms();
            fast_sessions.for_each_ecs_ready(|session| {
                let Some(player_entity) = session.player_entity() else { return };
                let player_id = session.player_id();
                let metabolism = Arc::clone(&fast_metabolism);
                let effects = Arc::clone(&fast_effects);
                let assets = Arc::clone(&assets);
                let effect_controller = Arc::clone(&effect_controller);
                session.execute_on_world(Box::new(move || {
                    let active = effect_controller.active_effects(player_entity.as_ref());
                    let resolve = |index: u32| assets.resolve(index).map(|id| id.0);
                    let detected = effects.lock().diff_tick(player_id, now, &active, resolve);
                    for effect in &detected {
                        metabolism.apply_effect(effect);
                    }
                }));
            });
            Ok(())
        });

        let metabolism = Arc::clone(&self.metabolism);
        let effects = Arc::clone(&self.effects);
        let sessions = Arc::clone(&ctx.sessions);
        let slow_handle = self.scheduler.schedule_periodic("metabolism-slow-tick", SLOW_TICK_INTERVAL, move || {
            let now = crate::now_ms();
            sessions.for_each_ecs_ready(|session| {
                let Some(player_entity) = session.player_entity() else { return };
                let Some(store) = session.entity_store() else { return };
                let player_id = session.player_id();
                let metabolism = Arc::clone(&metabolism);
                let effects = Arc::clone(&effects);
                session.execute_on_world(Box::new(move || {
                    let movement = store
                        .get_component(player_entity.as_ref(), TypeId::of::<MovementStates>())
                        .and_then(|b| b.downcast::<MovementStates>().ok())
                        .map(|b| *b)
                        .unwrap_or_default();
                    let creative = store
                        .get_component(player_entity.as_ref(), TypeId::of::<CreativeMode>())
                        .and_then(|b| b.downcast::<CreativeMode>().ok())
                        .map(|b| b.0)
                        .unwrap_or(false);
                    let activity = ActivitySnapshot {
                        sprinting: movement.sprinting,
                        swimming: movement.swimming,
                        in_combat: movement.in_combat,
                        creative_mode: creative,
                    };
                    let active_debuffs = effects.lock().active_debuff_kinds(player_id);
                    metabolism.slow_tick(player_id, now, activity, &active_debuffs);
                }));
            });
            Ok(())
        });

        *self.fast_tick_handle.lock() = Some(fast_handle);
        *self.slow_tick_handle.lock() = Some(slow_handle);
        Ok(())
    }

    fn on_shutdown(&self, ctx: &ModuleContext) {
        if let Some(handle) = self.fast_tick_handle.lock().take() {
            handle.cancel();
        }
        if let Some(handle) = self.slow_tick_handle.lock().take() {
            handle.cancel();
        }
        self.flush(ctx);
    }
}

#[cfg(test)]
#[path = "metabolism_module_tests.rs"]
mod tests;
