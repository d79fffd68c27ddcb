use super::*;
use crate::metabolism::{BaseDrainRates, DamageThresholds, MetabolismEngine, PoisonConfig};
use std::sync::Arc;
use uuid::Uuid;

fn player(n: u128) -> PlayerId {
    PlayerId::new(Uuid::from_u128(n))
}

fn router() -> (EventRouter, Arc<MetabolismEngine>) {
    let metabolism = Arc::new(MetabolismEngine::new(BaseDrainRates::default(), DamageThresholds::default(), PoisonConfig::default()));
    let router = EventRouter::new(metabolism.clone(), 1000, 10.0);
    (router, metabolism)
}

fn pos(x: i32) -> BlockPos {
    BlockPos { world_id: 0, x, y: 64, z: 0 }
}

#[test]
fn block_place_then_break_suppresses_xp() {
    let (router, _metabolism) = router();
    let p = player(1);

    router.route(&HostEvent::BlockPlaced { player: p, pos: pos(1) }, 0);
    let award = router.route(
        &HostEvent::BlockBroken { player: p, pos: pos(1), origin: BlockOrigin::Natural, block_id: "stone".to_string() },
        10,
    );

    assert!(award.is_none());
    assert_eq!(router.claim_block_count(), 0);
}

#[test]
fn breaking_an_unplaced_natural_block_awards_xp() {
    let (router, _metabolism) = router();
    let p = player(1);

    let award = router.route(
        &HostEvent::BlockBroken { player: p, pos: pos(2), origin: BlockOrigin::Natural, block_id: "stone".to_string() },
        0,
    );

    assert!(award.is_some());
}

#[test]
fn breaking_a_player_placed_origin_block_never_awards_xp_even_if_untracked() {
    let (router, _metabolism) = router();
    let p = player(1);

    let award = router.route(
        &HostEvent::BlockBroken { player: p, pos: pos(3), origin: BlockOrigin::PlayerPlaced, block_id: "stone".to_string() },
        0,
    );

    assert!(award.is_none());
}

#[test]
fn entity_remove_below_threshold_marks_metabolism_death() {
    let (router, metabolism) = router();
    let p = player(1);
    metabolism.track_player(p, 0);
    metabolism.test_set_stats(p, 5.0, 100.0, 100.0);

    router.route(&HostEvent::EntityRemoved { player: p }, 0);

    assert!(metabolism.snapshot(p).unwrap().is_marked_for_death_reset());
}

#[test]
fn entity_remove_above_threshold_does_not_mark_death() {
    let (router, metabolism) = router();
    let p = player(1);
    metabolism.track_player(p, 0);
    metabolism.test_set_stats(p, 80.0, 80.0, 80.0);

    router.route(&HostEvent::EntityRemoved { player: p }, 0);

    assert!(!metabolism.snapshot(p).unwrap().is_marked_for_death_reset());
}

#[test]
fn kill_feed_and_entity_remove_dedup_within_cooldown() {
    let (router, metabolism) = router();
    let p = player(1);
    metabolism.track_player(p, 0);

    let first = router.route(&HostEvent::KillFeed { victim: p }, 0);
    assert!(first.is_none());
    assert!(metabolism.snapshot(p).unwrap().is_marked_for_death_reset());

    metabolism.reset_if_marked_for_death(p);
    metabolism.test_set_stats(p, 3.0, 100.0, 100.0);
    assert!(!metabolism.snapshot(p).unwrap().is_marked_for_death_reset());

    router.route(&HostEvent::EntityRemoved { player: p }, 200);
    assert!(
        !metabolism.snapshot(p).unwrap().is_marked_for_death_reset(),
        "dedup window should suppress the second death path even though hunger is low"
    );

    router.route(&HostEvent::EntityRemoved { player: p }, 2000);
    assert!(
        metabolism.snapshot(p).unwrap().is_marked_for_death_reset(),
        "once the cool-down elapses the death path should fire again"
    );
}

#[test]
fn add_player_to_world_resets_metabolism_only_when_marked() {
    let (router, metabolism) = router();
    let p = player(1);
    metabolism.track_player(p, 0);

    router.route(&HostEvent::AddPlayerToWorld { player: p }, 0);
    assert_eq!(metabolism.snapshot(p).unwrap().hunger, 100.0);

    metabolism.mark_for_death_reset(p);
    metabolism.test_set_stats(p, 3.0, 3.0, 3.0);

    router.route(&HostEvent::AddPlayerToWorld { player: p }, 10);
    let reset = metabolism.snapshot(p).unwrap();
    assert!(!reset.is_marked_for_death_reset());
    assert_eq!(reset.hunger, 100.0);
}

#[test]
fn claim_block_tracking_is_bounded() {
    let metabolism = Arc::new(MetabolismEngine::new(BaseDrainRates::default(), DamageThresholds::default(), PoisonConfig::default()));
    let router = EventRouter::new(metabolism, 2, 10.0);
    let p = player(1);

    router.route(&HostEvent::BlockPlaced { player: p, pos: pos(1) }, 0);
    router.route(&HostEvent::BlockPlaced { player: p, pos: pos(2) }, 0);
    router.route(&HostEvent::BlockPlaced { player: p, pos: pos(3) }, 0);

    assert!(router.claim_block_count() <= 2);
}
