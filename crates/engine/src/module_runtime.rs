// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module Runtime: topologically orders registered modules by declared
//! dependency, drives each through the DISABLED → SETUP → STARTED → STOPPED
//! lifecycle, and hands out a shared [`ModuleContext`]. Downcasting replaces
//! the source's sealed module-inheritance hierarchy — each module is
//! registered under a capability tag kept alongside its boxed trait object,
//! resolved again later by [`ModuleRuntime::get`].

use std::any::Any;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;
use livingworld_core::ModuleId;
use livingworld_host::EventBus;
use parking_lot::RwLock;
use thiserror::Error;

use crate::session::SessionRegistry;

/// Lifecycle state of a registered module. Transitions are enforced by
/// [`ModuleState::can_transition_to`]; `ERROR` is reachable from any state
/// and only escapes back to `DISABLED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Disabled,
    Setup,
    Started,
    Stopped,
    Error,
}

impl ModuleState {
    pub fn can_transition_to(self, next: ModuleState) -> bool {
        use ModuleState::*;
        matches!(
            (self, next),
            (Disabled, Setup)
                | (Disabled, Error)
                | (Setup, Started)
                | (Setup, Stopped)
                | (Setup, Error)
                | (Started, Stopped)
                | (Started, Error)
                | (Stopped, Setup)
                | (Stopped, Error)
                | (Error, Disabled)
        )
    }
}

/// Shared services issued to every module at setup time. The runtime owns
/// this; modules hold a clone for the duration of their lifetime. `runtime`
/// is a back-reference (constructed via `Arc::new_cyclic`) letting a module
/// reach sibling modules through [`ModuleRuntime::get`] without the runtime
/// owning itself.
#[derive(Clone)]
pub struct ModuleContext {
    pub plugin_root: std::path::PathBuf,
    pub event_bus: Arc<dyn EventBus>,
    pub sessions: Arc<SessionRegistry>,
    pub runtime: std::sync::Weak<ModuleRuntime>,
}

/// Reported by a failed `on_setup`/`on_start` hook.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ModuleError(pub String);

impl ModuleError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// A registered feature module. `on_setup`/`on_start`/`on_shutdown` are the
/// lifecycle hooks; a failure in either of the first two moves the module to
/// `ERROR` without affecting sibling modules.
pub trait GameModule: Send + Sync {
    fn id(&self) -> &ModuleId;
    fn version(&self) -> &str;
    fn display_name(&self) -> &str;
    fn dependencies(&self) -> &HashSet<ModuleId>;
    fn on_setup(&self, ctx: &ModuleContext) -> Result<(), ModuleError>;
    fn on_start(&self, ctx: &ModuleContext) -> Result<(), ModuleError>;
    fn on_shutdown(&self, ctx: &ModuleContext);
}

struct Entry {
    module: Arc<dyn GameModule>,
    /// The same allocation as `module`, kept under its concrete type so
    /// [`ModuleRuntime::get`] can downcast back to it. Captured at
    /// [`ModuleRuntime::register`]'s generic call site, where the concrete
    /// type is still known, rather than threaded back through the trait.
    any: Arc<dyn Any + Send + Sync>,
    state: ModuleState,
    enabled: bool,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("module {module} depends on unregistered module {dependency}")]
    MissingDependency { module: ModuleId, dependency: ModuleId },
    #[error("module {module} depends on disabled module {dependency}")]
    DisabledDependency { module: ModuleId, dependency: ModuleId },
    #[error("cyclic module dependency detected, closed by {0}")]
    CyclicDependency(ModuleId),
    #[error("module {0} is not registered")]
    NotRegistered(ModuleId),
}

/// Orders and drives the registered module set through its lifecycle.
pub struct ModuleRuntime {
    ctx: ModuleContext,
    entries: RwLock<IndexMap<ModuleId, Entry>>,
    order: RwLock<Vec<ModuleId>>,
}

impl ModuleRuntime {
    /// Builds the runtime and its [`ModuleContext`] together via
    /// `Arc::new_cyclic`, so `ctx.runtime` can point back at the very
    /// runtime a module's hooks are being called from.
    pub fn new(plugin_root: std::path::PathBuf, event_bus: Arc<dyn EventBus>, sessions: Arc<SessionRegistry>) -> Arc<Self> {
        Arc::new_cyclic(|weak| {
            let ctx = ModuleContext { plugin_root, event_bus, sessions, runtime: weak.clone() };
            Self { ctx, entries: RwLock::new(IndexMap::new()), order: RwLock::new(Vec::new()) }
        })
    }

    pub fn context(&self) -> &ModuleContext {
        &self.ctx
    }

    /// Registers `module` with the given enabled flag, read from
    /// configuration before lifecycle begins. Safe to call before
    /// [`ModuleRuntime::setup_all`] only — once the order is resolved,
    /// later registrations are not included in that resolution.
    pub fn register<T: GameModule + 'static>(&self, module: Arc<T>, enabled: bool) {
        let id = module.id().clone();
        let any: Arc<dyn Any + Send + Sync> = module.clone();
        let module: Arc<dyn GameModule> = module;
        self.entries.write().insert(id, Entry { module, any, state: ModuleState::Disabled, enabled });
    }

    pub fn is_enabled(&self, id: &ModuleId) -> bool {
        self.entries.read().get(id).map(|e| e.enabled).unwrap_or(false)
    }

    pub fn state_of(&self, id: &ModuleId) -> Option<ModuleState> {
        self.entries.read().get(id).map(|e| e.state)
    }

    /// Type-safe downcast lookup via each module's capability tag, e.g.
    /// `runtime.get::<MetabolismModule>(&id)`.
    pub fn get<T: 'static>(&self, id: &ModuleId) -> Option<Arc<T>> {
        let any = Arc::clone(&self.entries.read().get(id)?.any);
        any.downcast::<T>().ok()
    }

    /// Borrow-based capability lookup: avoids cloning the `Arc` when the
    /// caller only needs to read through the module for the duration of
    /// `f`.
    pub fn get_ref<T: 'static>(&self, id: &ModuleId, f: impl FnOnce(&T)) -> bool {
        let entries = self.entries.read();
        let Some(entry) = entries.get(id) else { return false };
        match entry.any.downcast_ref::<T>() {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        }
    }

    /// Resolves setup order over the subgraph of modules that don't carry a
    /// missing/disabled dependency, and separately collects every module
    /// disqualified by one — directly or transitively through a disqualified
    /// dependency. Only a genuine cycle among the surviving modules is fatal;
    /// a missing or disabled dependency is reported per-module instead, so
    /// the rest of the graph still gets a chance to set up (§7, §8.4).
    fn resolve_order(&self) -> Result<(Vec<ModuleId>, HashMap<ModuleId, RuntimeError>), RuntimeError> {
        let entries = self.entries.read();
        let mut dependents: IndexMap<ModuleId, Vec<ModuleId>> = IndexMap::new();
        let mut invalid: HashMap<ModuleId, RuntimeError> = HashMap::new();

        for (id, entry) in entries.iter() {
            dependents.entry(id.clone()).or_default();
            for dep in entry.module.dependencies() {
                dependents.entry(dep.clone()).or_default().push(id.clone());
                match entries.get(dep) {
                    None => {
                        invalid
                            .entry(id.clone())
                            .or_insert_with(|| RuntimeError::MissingDependency { module: id.clone(), dependency: dep.clone() });
                    }
                    Some(dep_entry) if !dep_entry.enabled => {
                        invalid
                            .entry(id.clone())
                            .or_insert_with(|| RuntimeError::DisabledDependency { module: id.clone(), dependency: dep.clone() });
                    }
                    Some(_) => {}
                }
            }
        }

        // Propagate to every transitive dependent of an already-invalid module.
        let mut queue: VecDeque<ModuleId> = invalid.keys().cloned().collect();
        while let Some(id) = queue.pop_front() {
            let Some(deps) = dependents.get(&id) else { continue };
            for dependent in deps.clone() {
                if !invalid.contains_key(&dependent) {
                    invalid.insert(dependent.clone(), RuntimeError::DisabledDependency { module: dependent.clone(), dependency: id.clone() });
                    queue.push_back(dependent);
                }
            }
        }

        let mut in_degree: IndexMap<ModuleId, usize> = IndexMap::new();
        for (id, entry) in entries.iter() {
            if invalid.contains_key(id) {
                continue;
            }
            let degree = entry.module.dependencies().iter().filter(|dep| !invalid.contains_key(*dep)).count();
            in_degree.insert(id.clone(), degree);
        }

        let mut queue: VecDeque<ModuleId> = in_degree.iter().filter(|(_, deg)| **deg == 0).map(|(id, _)| id.clone()).collect();
        let mut order = Vec::with_capacity(in_degree.len());
        let mut remaining = in_degree.clone();

        while let Some(id) = queue.pop_front() {
            order.push(id.clone());
            if let Some(next) = dependents.get(&id) {
                for dep_id in next {
                    if invalid.contains_key(dep_id) {
                        continue;
                    }
                    if let Some(deg) = remaining.get_mut(dep_id) {
                        *deg -= 1;
                        if *deg == 0 {
                            queue.push_back(dep_id.clone());
                        }
                    }
                }
            }
        }

        if order.len() != in_degree.len() {
            let seen: HashSet<&ModuleId> = order.iter().collect();
            let closing = in_degree.keys().find(|id| !seen.contains(id)).cloned().unwrap_or_else(|| ModuleId::new("?"));
            return Err(RuntimeError::CyclicDependency(closing));
        }

        Ok((order, invalid))
    }

    /// Resolves the dependency order, moves every module disqualified by a
    /// missing/disabled dependency straight to `ERROR` without calling its
    /// `on_setup`, then calls `on_setup` for each remaining enabled module in
    /// order. A module whose own setup fails moves to `ERROR` and the
    /// remaining modules still get a chance to set up. Only a cyclic
    /// dependency graph aborts the call entirely.
    pub fn setup_all(&self) -> Result<(), RuntimeError> {
        let (order, invalid) = self.resolve_order()?;

        for (id, err) in &invalid {
            tracing::error!(module = %id, error = %err, "module dependency unsatisfied; module moves to ERROR without running setup");
            self.transition(id, ModuleState::Error);
        }

        for id in &order {
            let (enabled, module) = {
                let entries = self.entries.read();
                let Some(entry) = entries.get(id) else { continue };
                (entry.enabled, Arc::clone(&entry.module))
            };
            if !enabled {
                continue;
            }
            match module.on_setup(&self.ctx) {
                Ok(()) => self.transition(id, ModuleState::Setup),
                Err(err) => {
                    tracing::error!(module = %id, error = %err, "module setup failed");
                    self.transition(id, ModuleState::Error);
                }
            }
        }
        *self.order.write() = order;
        Ok(())
    }

    /// Starts every module currently in `SETUP`, in dependency order.
    pub fn start_all(&self) {
        let order = self.order.read().clone();
        for id in &order {
            let (state, module) = {
                let entries = self.entries.read();
                let Some(entry) = entries.get(id) else { continue };
                (entry.state, Arc::clone(&entry.module))
            };
            if state != ModuleState::Setup {
                continue;
            }
            match module.on_start(&self.ctx) {
                Ok(()) => self.transition(id, ModuleState::Started),
                Err(err) => {
                    tracing::error!(module = %id, error = %err, "module start failed");
                    self.transition(id, ModuleState::Error);
                }
            }
        }
    }

    /// Shuts down every module in reverse dependency order. Shutdown is
    /// best-effort: a panic-free call is assumed, and the hook has no
    /// failure path to report.
    pub fn shutdown_all(&self) {
        let order = self.order.read().clone();
        for id in order.iter().rev() {
            let module = {
                let entries = self.entries.read();
                entries.get(id).map(|e| Arc::clone(&e.module))
            };
            if let Some(module) = module {
                module.on_shutdown(&self.ctx);
                self.transition(id, ModuleState::Stopped);
            }
        }
    }

    fn transition(&self, id: &ModuleId, next: ModuleState) {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get_mut(id) {
            if entry.state.can_transition_to(next) || next == ModuleState::Error {
                entry.state = next;
            } else {
                tracing::warn!(module = %id, from = ?entry.state, to = ?next, "rejected illegal module state transition");
            }
        }
    }
}

#[cfg(test)]
#[path = "module_runtime_tests.rs"]
mod tests;
