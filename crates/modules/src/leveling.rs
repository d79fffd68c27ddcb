// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leveling Module: records XP totals from natural block breaks and
//! dispatches a level-up notification. Depends on `metabolism` only to
//! prove ordering — it does not read metabolism state. XP curve design is
//! explicitly out of scope; `xp_per_level` is a flat placeholder threshold.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use livingworld_core::{ModuleId, PlayerId};
use livingworld_engine::{GameModule, ModuleContext, ModuleError};
use livingworld_host::notify::{NotificationDispatcher, NotifyKind};
use livingworld_host::{BlockOrigin, HostEvent, HostEventType};
use livingworld_storage::{DocumentId, FileDocumentStore};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

const XP_PER_NATURAL_BREAK: u64 = 5;
const XP_PER_LEVEL: u64 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct PlayerXpData {
    pub total_xp: u64,
    pub level: u32,
}

impl PlayerXpData {
    fn add_xp(&mut self, amount: u64) -> bool {
        self.total_xp += amount;
        let new_level = (self.total_xp / XP_PER_LEVEL) as u32;
        let leveled_up = new_level > self.level;
        self.level = new_level;
        leveled_up
    }
}

/// The shared, clonable half of the module — captured into the event
/// handler closure so `on_start` never needs `Arc<Self>`.
struct Shared {
    xp: Mutex<HashMap<PlayerId, PlayerXpData>>,
    notify: Arc<dyn NotificationDispatcher>,
}

impl Shared {
    /// Records a natural block break, returning whether it crossed a level
    /// boundary. Player-placed blocks never reach this — callers route
    /// through the Event Router's suppression first.
    fn award_break(&self, player_id: PlayerId) -> bool {
        let mut xp = self.xp.lock();
        let data = xp.entry(player_id).or_default();
        data.add_xp(XP_PER_NATURAL_BREAK)
    }
}

pub struct LevelingModule {
    id: ModuleId,
    deps: HashSet<ModuleId>,
    shared: Arc<Shared>,
    store: FileDocumentStore,
}

impl LevelingModule {
    pub fn new(notify: Arc<dyn NotificationDispatcher>, store_root: impl Into<std::path::PathBuf>) -> Self {
        let mut deps = HashSet::new();
        deps.insert(ModuleId::new("metabolism"));
        Self {
            id: ModuleId::new("leveling"),
            deps,
            shared: Arc::new(Shared { xp: Mutex::new(HashMap::new()), notify }),
            store: FileDocumentStore::new(store_root.into()),
        }
    }

    fn document_id(player_id: PlayerId) -> DocumentId {
        DocumentId::new("leveling/playerdata", player_id.as_uuid().to_string())
    }

    pub fn xp_of(&self, player_id: PlayerId) -> PlayerXpData {
        self.shared.xp.lock().get(&player_id).copied().unwrap_or_default()
    }
}

impl GameModule for LevelingModule {
    fn id(&self) -> &ModuleId {
        &self.id
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn display_name(&self) -> &str {
        "Leveling"
    }

    fn dependencies(&self) -> &HashSet<ModuleId> {
        &self.deps
    }

    fn on_setup(&self, _ctx: &ModuleContext) -> Result<(), ModuleError> {
        Ok(())
    }

    fn on_start(&self, ctx: &ModuleContext) -> Result<(), ModuleError> {
        let shared = Arc::clone(&self.shared);
        ctx.event_bus.register(
            HostEventType::BlockBroken,
            Box::new(move |event| {
                let HostEvent::BlockBroken { player, origin, .. } = event else { return };
                if *origin != BlockOrigin::Natural {
                    return;
                }
                if shared.award_break(*player) {
                    let shared = Arc::clone(&shared);
                    let player = *player;
                    tokio::spawn(async move {
                        let level = shared.xp.lock().get(&player).map(|d| d.level).unwrap_or(0);
                        if let Err(err) = shared
                            .notify
                            .title(player, "Level Up!", &format!("You reached level {level}"), NotifyKind::Success)
                            .await
                        {
                            tracing::warn!(player = %player, error = %err, "level-up notification failed");
                        }
                    });
                }
            }),
        );
        Ok(())
    }

    fn on_shutdown(&self, _ctx: &ModuleContext) {
        let xp = self.shared.xp.lock();
        let dirty: Vec<(DocumentId, PlayerXpData)> = xp.iter().map(|(player_id, data)| (Self::document_id(*player_id), *data)).collect();
        drop(xp);
        for (document, error) in self.store.save_all(dirty) {
            tracing::warn!(document = %document, error = %error, "leveling flush failed for one player");
        }
    }
}

#[cfg(test)]
#[path = "leveling_tests.rs"]
mod tests;
