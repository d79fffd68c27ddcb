// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Claims Module: owns the lifecycle of the shared [`ClaimBlockTracking`]
//! set — recording on placement, evicting on break, and periodically
//! logging its bounded size. Depends on nothing, demonstrating a
//! dependency-free registration against the runtime. Land-claim permission
//! checks and grid UI are explicitly out of scope.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use livingworld_core::ModuleId;
use livingworld_engine::{ClaimBlockTracking, GameModule, ModuleContext, ModuleError, Scheduler, TaskHandle};
use livingworld_host::{HostEvent, HostEventType};
use parking_lot::Mutex;

const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

pub struct ClaimsModule {
    id: ModuleId,
    deps: HashSet<ModuleId>,
    tracking: Arc<ClaimBlockTracking>,
    scheduler: Arc<Scheduler>,
    sweep_handle: Mutex<Option<TaskHandle>>,
}

impl ClaimsModule {
    pub fn new(cap: usize, scheduler: Arc<Scheduler>) -> Self {
        Self {
            id: ModuleId::new("claims"),
            deps: HashSet::new(),
            tracking: Arc::new(ClaimBlockTracking::new(cap)),
            scheduler,
            sweep_handle: Mutex::new(None),
        }
    }

    pub fn tracking(&self) -> &Arc<ClaimBlockTracking> {
        &self.tracking
    }
}

impl GameModule for ClaimsModule {
    fn id(&self) -> &ModuleId {
        &self.id
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn display_name(&self) -> &str {
        "Claims"
    }

    fn dependencies(&self) -> &HashSet<ModuleId> {
        &self.deps
    }

    fn on_setup(&self, _ctx: &ModuleContext) -> Result<(), ModuleError> {
        Ok(())
    }

    fn on_start(&self, ctx: &ModuleContext) -> Result<(), ModuleError> {
        let tracking = Arc::clone(&self.tracking);
        ctx.event_bus.register(
            HostEventType::BlockPlaced,
            Box::new(move |event| {
                if let HostEvent::BlockPlaced { pos, .. } = event {
                    tracking.record_placed(*pos);
                }
            }),
        );

        let tracking = Arc::clone(&self.tracking);
        ctx.event_bus.register(
            HostEventType::BlockBroken,
            Box::new(move |event| {
                if let HostEvent::BlockBroken { pos, .. } = event {
                    tracking.take_if_player_placed(*pos);
                }
            }),
        );

        let tracking = Arc::clone(&self.tracking);
        let handle = self.scheduler.schedule_periodic("claims-bounded-sweep", SWEEP_INTERVAL, move || {
            tracing::debug!(tracked_blocks = tracking.len(), "claim-block tracking sweep");
            Ok(())
        });
        *self.sweep_handle.lock() = Some(handle);
        Ok(())
    }

    fn on_shutdown(&self, _ctx: &ModuleContext) {
        if let Some(handle) = self.sweep_handle.lock().take() {
            handle.cancel();
        }
    }
}

#[cfg(test)]
#[path = "claims_tests.rs"]
mod tests;
