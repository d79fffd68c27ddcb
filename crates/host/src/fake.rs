// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
#![cfg_attr(coverage_nightly, coverage(off))]

//! `FakeWorld`: an in-memory stand-in for the host's entity/effect/event/
//! notification surface, in the shape of the teacher's `FakeNotifyAdapter`
//! (an `Arc<Mutex<State>>` recording calls for assertions) generalized to
//! all five host traits the core subsystems consume.

use crate::dispatcher::WorldDispatcher;
use crate::effects::{ActiveEffect, EffectController};
use crate::entity::{AssetId, AssetMap, EntityRef, EntityStore, NetHandle};
use crate::events::{EventBus, EventHandler, HostEvent, HostEventType};
use crate::notify::{NotificationDispatcher, NotifyError, NotifyKind};
use async_trait::async_trait;
use livingworld_core::PlayerId;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A test-only entity reference. Carries no host state, only an identity
/// and a liveness flag the test can flip to simulate despawn.
#[derive(Debug, Clone)]
pub struct FakeEntity {
    id: u64,
    alive: Arc<Mutex<bool>>,
}

impl FakeEntity {
    pub fn new(id: u64) -> Self {
        Self { id, alive: Arc::new(Mutex::new(true)) }
    }

    pub fn invalidate(&self) {
        *self.alive.lock() = false;
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl EntityRef for FakeEntity {
    fn is_valid(&self) -> bool {
        *self.alive.lock()
    }
}

/// A test-only network handle. Mirrors `FakeEntity`'s liveness-flag shape.
#[derive(Debug, Clone)]
pub struct FakeNetHandle {
    alive: Arc<Mutex<bool>>,
}

impl FakeNetHandle {
    pub fn new() -> Self {
        Self { alive: Arc::new(Mutex::new(true)) }
    }

    pub fn invalidate(&self) {
        *self.alive.lock() = false;
    }
}

impl Default for FakeNetHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl NetHandle for FakeNetHandle {
    fn is_valid(&self) -> bool {
        *self.alive.lock()
    }
}

#[derive(Debug, Clone)]
pub struct NotifyCall {
    pub player: PlayerId,
    pub kind: NotifyKind,
    pub title: String,
    pub body: String,
}

type ComponentFactory = Box<dyn Fn() -> Box<dyn Any> + Send + Sync>;

struct State {
    components: HashMap<(u64, TypeId), ComponentFactory>,
    assets: HashMap<u32, AssetId>,
    effects: HashMap<u64, Vec<ActiveEffect>>,
    notify_calls: Vec<NotifyCall>,
    dispatched_jobs: u64,
    accepting: bool,
    global_handlers: Vec<EventHandler>,
    typed_handlers: HashMap<HostEventType, Vec<EventHandler>>,
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("notify_calls", &self.notify_calls.len())
            .field("dispatched_jobs", &self.dispatched_jobs)
            .field("accepting", &self.accepting)
            .finish()
    }
}

/// In-memory host double used by the engine crate's test suite. Every
/// method runs synchronously and inline — there is no real world thread —
/// so tests calling through [`WorldDispatcher::execute`] observe effects
/// immediately.
#[derive(Clone)]
pub struct FakeWorld {
    state: Arc<Mutex<State>>,
}

impl Default for FakeWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeWorld {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                components: HashMap::new(),
                assets: HashMap::new(),
                effects: HashMap::new(),
                notify_calls: Vec::new(),
                dispatched_jobs: 0,
                accepting: true,
                global_handlers: Vec::new(),
                typed_handlers: HashMap::new(),
            })),
        }
    }

    /// Registers a component value for `entity_id`, retrievable later via
    /// [`EntityStore::get_component`] with the matching `TypeId`.
    pub fn set_component<T: Any + Clone + Send + Sync + 'static>(&self, entity_id: u64, value: T) {
        let factory: ComponentFactory = Box::new(move || Box::new(value.clone()));
        self.state.lock().components.insert((entity_id, TypeId::of::<T>()), factory);
    }

    pub fn set_asset(&self, index: u32, id: impl Into<String>) {
        self.state.lock().assets.insert(index, AssetId(id.into()));
    }

    pub fn set_active_effects(&self, entity_id: u64, effects: Vec<ActiveEffect>) {
        self.state.lock().effects.insert(entity_id, effects);
    }

    pub fn notify_calls(&self) -> Vec<NotifyCall> {
        self.state.lock().notify_calls.clone()
    }

    pub fn dispatched_job_count(&self) -> u64 {
        self.state.lock().dispatched_jobs
    }

    /// Simulates dispatcher shutdown: subsequent `execute` calls return
    /// `false` without running the job, mirroring a real world thread that
    /// has stopped accepting work.
    pub fn stop_accepting(&self) {
        self.state.lock().accepting = false;
    }

    /// Delivers `event` to every matching registered handler, synchronously.
    /// Handlers aren't `Clone`, so this invokes them while holding the lock
    /// rather than copying them out first.
    pub fn emit(&self, event: HostEvent) {
        let state = self.state.lock();
        for h in &state.global_handlers {
            h(&event);
        }
        if let Some(hs) = state.typed_handlers.get(&event.event_type()) {
            for h in hs {
                h(&event);
            }
        }
    }
}

impl EntityStore for FakeWorld {
    fn get_component(&self, entity: &dyn EntityRef, component_type: TypeId) -> Option<Box<dyn Any>> {
        if !entity.is_valid() {
            return None;
        }
        let downcast = (entity as &dyn Any).downcast_ref::<FakeEntity>()?;
        let state = self.state.lock();
        state.components.get(&(downcast.id(), component_type)).map(|factory| factory())
    }
}

impl AssetMap for FakeWorld {
    fn resolve(&self, index: u32) -> Option<AssetId> {
        self.state.lock().assets.get(&index).cloned()
    }
}

impl EffectController for FakeWorld {
    fn active_effects(&self, entity: &dyn EntityRef) -> Vec<ActiveEffect> {
        let Some(fake) = (entity as &dyn Any).downcast_ref::<FakeEntity>() else {
            return Vec::new();
        };
        self.state.lock().effects.get(&fake.id()).cloned().unwrap_or_default()
    }
}

impl WorldDispatcher for FakeWorld {
    fn execute(&self, job: Box<dyn FnOnce() + Send>) -> bool {
        let mut state = self.state.lock();
        if !state.accepting {
            return false;
        }
        state.dispatched_jobs += 1;
        drop(state);
        job();
        true
    }
}

impl EventBus for FakeWorld {
    fn register(&self, event_type: HostEventType, handler: EventHandler) {
        self.state.lock().typed_handlers.entry(event_type).or_default().push(handler);
    }

    fn register_global(&self, handler: EventHandler) {
        self.state.lock().global_handlers.push(handler);
    }
}

#[async_trait]
impl NotificationDispatcher for FakeWorld {
    async fn title(&self, player: PlayerId, title: &str, subtitle: &str, kind: NotifyKind) -> Result<(), NotifyError> {
        self.state.lock().notify_calls.push(NotifyCall {
            player,
            kind,
            title: title.to_string(),
            body: subtitle.to_string(),
        });
        Ok(())
    }

    async fn sound(&self, player: PlayerId, sound_id: &str) -> Result<(), NotifyError> {
        self.state.lock().notify_calls.push(NotifyCall {
            player,
            kind: NotifyKind::Info,
            title: "sound".to_string(),
            body: sound_id.to_string(),
        });
        Ok(())
    }

    async fn chat(&self, player: PlayerId, message: &str, kind: NotifyKind) -> Result<(), NotifyError> {
        self.state.lock().notify_calls.push(NotifyCall {
            player,
            kind,
            title: "chat".to_string(),
            body: message.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
