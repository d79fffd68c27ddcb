// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HUD Aggregator Module: depends on `metabolism` and `leveling`, reads
//! their published state through [`livingworld_engine::ModuleRuntime::get`]
//! on a slow poll, and persists a per-player visibility-flags document. HUD
//! widget layout itself is explicitly out of scope — this module only
//! aggregates and persists flags, it renders nothing.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use livingworld_core::{ModuleId, PlayerId};
use livingworld_engine::{GameModule, ModuleContext, ModuleError, Scheduler, TaskHandle};
use livingworld_storage::{DocumentId, FileDocumentStore};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::leveling::LevelingModule;
use crate::metabolism_module::MetabolismModule;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct HudVisibilityFlags {
    pub show_hunger_warning: bool,
    pub show_thirst_warning: bool,
    pub show_energy_warning: bool,
    pub show_level_up_badge: bool,
}

pub struct HudAggregatorModule {
    id: ModuleId,
    deps: HashSet<ModuleId>,
    metabolism_id: ModuleId,
    leveling_id: ModuleId,
    scheduler: Arc<Scheduler>,
    store: FileDocumentStore,
    poll_handle: Mutex<Option<TaskHandle>>,
}

impl HudAggregatorModule {
    pub fn new(scheduler: Arc<Scheduler>, store_root: impl Into<std::path::PathBuf>) -> Self {
        let mut deps = HashSet::new();
        deps.insert(ModuleId::new("metabolism"));
        deps.insert(ModuleId::new("leveling"));
        Self {
            id: ModuleId::new("hud"),
            deps,
            metabolism_id: ModuleId::new("metabolism"),
            leveling_id: ModuleId::new("leveling"),
            scheduler,
            store: FileDocumentStore::new(store_root.into()),
            poll_handle: Mutex::new(None),
        }
    }

    fn document_id(player_id: PlayerId) -> DocumentId {
        DocumentId::new("playerdata/hud", player_id.as_uuid().to_string())
    }
}

impl GameModule for HudAggregatorModule {
    fn id(&self) -> &ModuleId {
        &self.id
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn display_name(&self) -> &str {
        "HUD Aggregator"
    }

    fn dependencies(&self) -> &HashSet<ModuleId> {
        &self.deps
    }

    fn on_setup(&self, _ctx: &ModuleContext) -> Result<(), ModuleError> {
        Ok(())
    }

    fn on_start(&self, ctx: &ModuleContext) -> Result<(), ModuleError> {
        let runtime = ctx.runtime.clone();
        let sessions = Arc::clone(&ctx.sessions);
        let store = self.store.clone();
        let metabolism_id = self.metabolism_id.clone();
        let leveling_id = self.leveling_id.clone();

        let handle = self.scheduler.schedule_periodic("hud-slow-poll", POLL_INTERVAL, move || {
            let Some(runtime) = runtime.upgrade() else { return Ok(()) };
            let Some(metabolism) = runtime.get::<MetabolismModule>(&metabolism_id) else { return Ok(()) };
            let Some(leveling) = runtime.get::<LevelingModule>(&leveling_id) else { return Ok(()) };

            sessions.for_each(|session| {
                let player_id = session.player_id();
                let Some(data) = metabolism.metabolism().snapshot(player_id) else { return };
                let xp = leveling.xp_of(player_id);
                let flags = HudVisibilityFlags {
                    show_hunger_warning: data.damage_flagged.hunger,
                    show_thirst_warning: data.damage_flagged.thirst,
                    show_energy_warning: data.damage_flagged.energy,
                    show_level_up_badge: xp.level > 0,
                };
                if let Err(err) = store.save(&Self::document_id(player_id), &flags) {
                    tracing::warn!(player = %player_id, error = %err, "hud flush failed for this player");
                }
            });
            Ok(())
        });
        *self.poll_handle.lock() = Some(handle);
        Ok(())
    }

    fn on_shutdown(&self, _ctx: &ModuleContext) {
        if let Some(handle) = self.poll_handle.lock().take() {
            handle.cancel();
        }
    }
}

#[cfg(test)]
#[path = "hud_aggregator_tests.rs"]
mod tests;
