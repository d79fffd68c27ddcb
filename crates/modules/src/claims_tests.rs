use super::*;
use livingworld_engine::SessionRegistry;
use livingworld_host::fake::FakeWorld;
use livingworld_host::{BlockOrigin, BlockPos};
use std::sync::Weak;

fn test_ctx(event_bus: Arc<FakeWorld>) -> ModuleContext {
    ModuleContext {
        plugin_root: std::path::PathBuf::from("/tmp/livingworld-claims-test"),
        event_bus,
        sessions: Arc::new(SessionRegistry::new()),
        runtime: Weak::new(),
    }
}

fn pos(x: i32) -> BlockPos {
    BlockPos { world_id: 0, x, y: 64, z: 0 }
}

#[tokio::test]
async fn placing_then_breaking_evicts_the_tracked_block() {
    let world = Arc::new(FakeWorld::new());
    let module = ClaimsModule::new(16, Arc::new(Scheduler::new()));
    let ctx = test_ctx(world.clone());
    module.on_setup(&ctx).expect("setup");
    module.on_start(&ctx).expect("start");

    let p = livingworld_core::PlayerId::new(uuid::Uuid::from_u128(1));
    world.emit(HostEvent::BlockPlaced { player: p, pos: pos(1) });
    assert_eq!(module.tracking().len(), 1);

    world.emit(HostEvent::BlockBroken { player: p, pos: pos(1), origin: BlockOrigin::PlayerPlaced, block_id: "stone".into() });
    assert_eq!(module.tracking().len(), 0);

    module.on_shutdown(&ctx);
}

#[tokio::test]
async fn tracking_stays_bounded_under_churn() {
    let world = Arc::new(FakeWorld::new());
    let module = ClaimsModule::new(2, Arc::new(Scheduler::new()));
    let ctx = test_ctx(world.clone());
    module.on_setup(&ctx).expect("setup");
    module.on_start(&ctx).expect("start");

    let p = livingworld_core::PlayerId::new(uuid::Uuid::from_u128(1));
    for i in 0..10 {
        world.emit(HostEvent::BlockPlaced { player: p, pos: pos(i) });
    }

    assert!(module.tracking().len() <= 2);
    module.on_shutdown(&ctx);
}
