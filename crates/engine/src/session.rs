// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Player Session Registry: tracks connected players, holds lazily-populated
//! ECS handles, and publishes `ecs_ready` across threads with a release/
//! acquire barrier per the registry's handle-publication invariant.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use livingworld_core::PlayerId;
use livingworld_host::{EntityRef, EntityStore, NetHandle, WorldDispatcher};
use parking_lot::{Mutex, RwLock};

struct EcsHandles {
    entity_ref: Arc<dyn EntityRef>,
    store: Arc<dyn EntityStore>,
    world: Arc<dyn WorldDispatcher>,
    net_handle: Arc<dyn NetHandle>,
    player_entity: Arc<dyn EntityRef>,
}

/// One per connected player. Handles are set together by
/// [`SessionRegistry::set_ecs_handles`] and read back through `ecs_ready`'s
/// acquire barrier — a reader observing `ecs_ready() == true` is guaranteed
/// to see every handle written alongside it.
pub struct PlayerSession {
    player_id: PlayerId,
    connected_at_ms: u64,
    ecs_ready: AtomicBool,
    handles: Mutex<Option<EcsHandles>>,
}

impl PlayerSession {
    fn new(player_id: PlayerId, connected_at_ms: u64) -> Self {
        Self { player_id, connected_at_ms, ecs_ready: AtomicBool::new(false), handles: Mutex::new(None) }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn connected_at_ms(&self) -> u64 {
        self.connected_at_ms
    }

    pub fn is_ecs_ready(&self) -> bool {
        self.ecs_ready.load(Ordering::Acquire)
    }

    /// Submits `action` to the world dispatcher if the session is ready.
    /// Fire-and-forget: returns `true` only if the job was accepted, never a
    /// completion guarantee. Callers must re-validate any entity reference
    /// they capture — the session may become not-ready by the time the job
    /// runs.
    pub fn execute_on_world(&self, action: Box<dyn FnOnce() + Send>) -> bool {
        if !self.is_ecs_ready() {
            return false;
        }
        let world = {
            let guard = self.handles.lock();
            match guard.as_ref() {
                Some(h) => Arc::clone(&h.world),
                None => return false,
            }
        };
        world.execute(action)
    }

    /// The Player entity's own reference, distinct from `entity_ref` — this
    /// is what component lookups for Creative mode and `MovementStates` are
    /// made against. `None` if the session isn't ready.
    pub fn player_entity(&self) -> Option<Arc<dyn EntityRef>> {
        self.handles.lock().as_ref().map(|h| Arc::clone(&h.player_entity))
    }

    /// The entity store handle used to resolve components off `player_entity`.
    /// `None` if the session isn't ready.
    pub fn entity_store(&self) -> Option<Arc<dyn EntityStore>> {
        self.handles.lock().as_ref().map(|h| Arc::clone(&h.store))
    }
}

/// Duplicate-safe, idempotent registry of active player sessions.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<PlayerId, Arc<PlayerSession>>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self { sessions: RwLock::new(HashMap::new()) }
    }

    /// Registers `player_id`, or returns the existing session if already
    /// registered — a duplicate connect event is not an error, only logged.
    pub fn register(&self, player_id: PlayerId, now_ms: u64) -> Arc<PlayerSession> {
        if let Some(existing) = self.sessions.read().get(&player_id) {
            tracing::warn!(player = %player_id, "duplicate session registration; reusing existing session");
            return Arc::clone(existing);
        }
        let mut sessions = self.sessions.write();
        if let Some(existing) = sessions.get(&player_id) {
            tracing::warn!(player = %player_id, "duplicate session registration; reusing existing session");
            return Arc::clone(existing);
        }
        let session = Arc::new(PlayerSession::new(player_id, now_ms));
        sessions.insert(player_id, Arc::clone(&session));
        session
    }

    /// Sets all five ECS handles together and publishes `ecs_ready` with a
    /// release store — any thread observing `ecs_ready == true` afterwards
    /// is guaranteed (via the matching acquire load) to see these handles.
    /// `ecs_ready` is derived, not assumed: it is only set if `entity_ref`
    /// and `player_entity` are both still valid at publication time.
    pub fn set_ecs_handles(
        &self,
        player_id: PlayerId,
        entity_ref: Arc<dyn EntityRef>,
        store: Arc<dyn EntityStore>,
        world: Arc<dyn WorldDispatcher>,
        net_handle: Arc<dyn NetHandle>,
        player_entity: Arc<dyn EntityRef>,
    ) -> bool {
        let Some(session) = self.get(player_id) else {
            return false;
        };
        let ready = entity_ref.is_valid() && player_entity.is_valid();
        *session.handles.lock() = Some(EcsHandles { entity_ref, store, world, net_handle, player_entity });
        session.ecs_ready.store(ready, Ordering::Release);
        ready
    }

    /// Clears `ecs_ready` first (so in-flight readers stop trusting the
    /// handles), then drops the handles, then removes the session entirely.
    pub fn unregister(&self, player_id: PlayerId) {
        if let Some(session) = self.sessions.read().get(&player_id) {
            session.ecs_ready.store(false, Ordering::Release);
            *session.handles.lock() = None;
        }
        self.sessions.write().remove(&player_id);
    }

    pub fn get(&self, player_id: PlayerId) -> Option<Arc<PlayerSession>> {
        self.sessions.read().get(&player_id).cloned()
    }

    pub fn require(&self, player_id: PlayerId) -> Result<Arc<PlayerSession>, SessionError> {
        self.get(player_id).ok_or(SessionError::NotRegistered(player_id))
    }

    pub fn is_ecs_ready(&self, player_id: PlayerId) -> bool {
        self.get(player_id).map(|s| s.is_ecs_ready()).unwrap_or(false)
    }

    /// Weakly-consistent snapshot iteration over every registered session.
    pub fn for_each(&self, mut f: impl FnMut(&Arc<PlayerSession>)) {
        for session in self.sessions.read().values() {
            f(session);
        }
    }

    pub fn for_each_ecs_ready(&self, mut f: impl FnMut(&Arc<PlayerSession>)) {
        for session in self.sessions.read().values() {
            if session.is_ecs_ready() {
                f(session);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("player {0} has no registered session")]
    NotRegistered(PlayerId),
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
