// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end coverage of the Module Runtime's dependency ordering against
//! both a failing graph and the shipped consumer modules' real graph.

use std::collections::HashSet;
use std::sync::Arc;

use livingworld_core::ModuleId;
use livingworld_engine::{EffectDiffDetector, GameModule, ModuleContext, ModuleError, ModuleRuntime, ModuleState, Scheduler};
use livingworld_host::fake::FakeWorld;
use livingworld_modules::{HudAggregatorModule, LevelingModule, MetabolismModule};
use parking_lot::Mutex;

struct StubModule {
    id: ModuleId,
    deps: HashSet<ModuleId>,
}

impl GameModule for StubModule {
    fn id(&self) -> &ModuleId {
        &self.id
    }
    fn version(&self) -> &str {
        "0.0.0"
    }
    fn display_name(&self) -> &str {
        "stub"
    }
    fn dependencies(&self) -> &HashSet<ModuleId> {
        &self.deps
    }
    fn on_setup(&self, _ctx: &ModuleContext) -> Result<(), ModuleError> {
        Ok(())
    }
    fn on_start(&self, _ctx: &ModuleContext) -> Result<(), ModuleError> {
        Ok(())
    }
    fn on_shutdown(&self, _ctx: &ModuleContext) {}
}

fn deps(ids: &[&str]) -> HashSet<ModuleId> {
    ids.iter().map(|s| ModuleId::new(*s)).collect()
}

/// Scenario: module dependency failure. A (deps=∅, disabled), B (deps={A}),
/// C (deps={B}); only B and C enabled. Both B and C must move to ERROR
/// without their `on_setup` ever running, A stays DISABLED, and `setup_all`
/// itself succeeds rather than aborting for the whole runtime — an
/// independent, unrelated module must still reach SETUP.
#[test]
fn enabling_a_module_without_its_disabled_dependency_moves_it_and_its_dependents_to_error() {
    let world = Arc::new(FakeWorld::new());
    let runtime = ModuleRuntime::new(
        std::path::PathBuf::from("/tmp/livingworld-module-dependency-test"),
        world,
        Arc::new(livingworld_engine::SessionRegistry::new()),
    );

    runtime.register(Arc::new(StubModule { id: ModuleId::new("A"), deps: HashSet::new() }), false);
    runtime.register(Arc::new(StubModule { id: ModuleId::new("B"), deps: deps(&["A"]) }), true);
    runtime.register(Arc::new(StubModule { id: ModuleId::new("C"), deps: deps(&["B"]) }), true);
    runtime.register(Arc::new(StubModule { id: ModuleId::new("independent"), deps: HashSet::new() }), true);

    runtime.setup_all().expect("a disabled dependency is reported per-module, not a hard abort");

    assert_eq!(runtime.state_of(&ModuleId::new("A")), Some(ModuleState::Disabled));
    assert_eq!(runtime.state_of(&ModuleId::new("B")), Some(ModuleState::Error));
    assert_eq!(runtime.state_of(&ModuleId::new("C")), Some(ModuleState::Error));
    assert_eq!(runtime.state_of(&ModuleId::new("independent")), Some(ModuleState::Setup));
}

/// Scenario: the shipped consumer modules form a real four-module graph
/// (`claims` standalone, `metabolism` standalone, `leveling` depends on
/// `metabolism`, `hud` depends on both) and the runtime must set all of
/// them up and start them in an order that respects every dependency.
#[test]
fn the_four_consumer_modules_set_up_and_start_in_dependency_order() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let world = Arc::new(FakeWorld::new());
    let runtime = ModuleRuntime::new(tmp.path().to_path_buf(), world.clone(), Arc::new(livingworld_engine::SessionRegistry::new()));

    let scheduler = Arc::new(Scheduler::new());
    let metabolism_engine = Arc::new(livingworld_engine::MetabolismEngine::new(
        Default::default(),
        Default::default(),
        Default::default(),
    ));
    let effects = Arc::new(Mutex::new(EffectDiffDetector::default()));

    let claims = Arc::new(livingworld_modules::ClaimsModule::new(1000, scheduler.clone()));
    let metabolism = Arc::new(MetabolismModule::new(
        metabolism_engine,
        effects,
        world.clone(),
        world.clone(),
        scheduler.clone(),
        tmp.path(),
    ));
    let leveling = Arc::new(LevelingModule::new(world.clone(), tmp.path()));
    let hud = Arc::new(HudAggregatorModule::new(scheduler.clone(), tmp.path()));

    runtime.register(claims, true);
    runtime.register(metabolism, true);
    runtime.register(leveling, true);
    runtime.register(hud, true);

    runtime.setup_all().expect("a well-formed dependency graph must set up cleanly");
    runtime.start_all();

    for name in ["claims", "metabolism", "leveling", "hud"] {
        assert_eq!(runtime.state_of(&ModuleId::new(name)), Some(ModuleState::Started), "{name} must reach STARTED");
    }

    runtime.shutdown_all();
    for name in ["claims", "metabolism", "leveling", "hud"] {
        assert_eq!(runtime.state_of(&ModuleId::new(name)), Some(ModuleState::Stopped), "{name} must reach STOPPED on shutdown");
    }
}
