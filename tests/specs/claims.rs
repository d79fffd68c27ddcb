// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end coverage of player-placed-block XP suppression, driven
//! through the real Event Router rather than the claims module's bare
//! tracking set, since XP awarding lives in the router.

use std::sync::Arc;

use livingworld_core::PlayerId;
use livingworld_engine::{BaseDrainRates, DamageThresholds, EventRouter, MetabolismEngine, PoisonConfig};
use livingworld_host::{BlockOrigin, BlockPos, HostEvent};
use uuid::Uuid;

fn player(n: u128) -> PlayerId {
    PlayerId::new(Uuid::from_u128(n))
}

fn pos(x: i32) -> BlockPos {
    BlockPos { world_id: 0, x, y: 64, z: 10 }
}

/// Scenario: player-placed block suppression. p4 places a log, breaks it —
/// no XP, and the tracking entry is gone. A different player then breaks a
/// naturally-generated log at a different position — XP is awarded.
#[test]
fn placing_then_breaking_suppresses_xp_but_a_natural_break_elsewhere_still_awards_it() {
    let metabolism = Arc::new(MetabolismEngine::new(BaseDrainRates::default(), DamageThresholds::default(), PoisonConfig::default()));
    let router = EventRouter::new(metabolism, 1000, 10.0);

    let p4 = player(4);
    let placed_at = pos(10);
    router.route(&HostEvent::BlockPlaced { player: p4, pos: placed_at }, 0);
    assert_eq!(router.claim_block_count(), 1);

    let suppressed = router.route(
        &HostEvent::BlockBroken { player: p4, pos: placed_at, origin: BlockOrigin::PlayerPlaced, block_id: "log".to_string() },
        10,
    );
    assert!(suppressed.is_none(), "breaking your own placed block must never award XP");
    assert_eq!(router.claim_block_count(), 0, "the tracking entry must be evicted once broken");

    let other_player = player(5);
    let natural_at = pos(11);
    let award = router.route(
        &HostEvent::BlockBroken { player: other_player, pos: natural_at, origin: BlockOrigin::Natural, block_id: "log".to_string() },
        20,
    );
    assert!(award.is_some(), "breaking a naturally-generated block must award XP");
    assert_eq!(award.unwrap().player_id, other_player);
}
