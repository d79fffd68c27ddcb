// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Router: fans host events out to the Registry and Metabolism
//! Engine, tracks player-placed blocks to suppress XP on their removal, and
//! deduplicates overlapping death-detection paths within a short cool-down.

use std::collections::{HashMap, HashSet};

use livingworld_core::PlayerId;
use livingworld_host::{BlockOrigin, BlockPos, HostEvent};
use parking_lot::Mutex;

use crate::metabolism::MetabolismEngine;

/// Default cool-down keyed by `(player, event-class)` below which a second
/// death-path event for the same player is treated as a duplicate.
pub const DEDUP_COOLDOWN_MS: u64 = 1000;

/// Claim-block tracking: a bounded set of placed-block positions, consulted
/// on break to decide whether XP should be suppressed. Bounded by periodic
/// eviction so unbounded churn cannot grow it forever.
pub struct ClaimBlockTracking {
    positions: Mutex<HashSet<BlockPos>>,
    cap: usize,
}

impl ClaimBlockTracking {
    pub fn new(cap: usize) -> Self {
        Self { positions: Mutex::new(HashSet::new()), cap }
    }

    pub fn record_placed(&self, pos: BlockPos) {
        let mut positions = self.positions.lock();
        if positions.len() >= self.cap && !positions.contains(&pos) {
            tracing::warn!(cap = self.cap, "claim-block tracking at capacity; rejecting new placement record");
            return;
        }
        positions.insert(pos);
    }

    /// Removes `pos`, returning whether it had been recorded as
    /// player-placed (i.e. whether the break should suppress XP).
    pub fn take_if_player_placed(&self, pos: BlockPos) -> bool {
        self.positions.lock().remove(&pos)
    }

    pub fn len(&self) -> usize {
        self.positions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EventClass {
    Death,
}

/// Fans host events to the session/metabolism layer, deduplicating
/// overlapping death-detection paths and tracking player-placed blocks.
pub struct EventRouter {
    metabolism: std::sync::Arc<MetabolismEngine>,
    claim_blocks: ClaimBlockTracking,
    dedup: Mutex<HashMap<(PlayerId, EventClass), u64>>,
    damage_threshold: f64,
}

/// XP to award for breaking a naturally-generated block, handed to whatever
/// consumer (leveling module) is listening; the core does not compute XP
/// curves itself.
#[derive(Debug, Clone, Copy)]
pub struct XpAward {
    pub player_id: PlayerId,
    pub amount: u64,
}

impl EventRouter {
    pub fn new(metabolism: std::sync::Arc<MetabolismEngine>, claim_block_cap: usize, damage_threshold: f64) -> Self {
        Self {
            metabolism,
            claim_blocks: ClaimBlockTracking::new(claim_block_cap),
            dedup: Mutex::new(HashMap::new()),
            damage_threshold,
        }
    }

    fn dedup_passes(&self, player_id: PlayerId, class: EventClass, now_ms: u64) -> bool {
        let mut dedup = self.dedup.lock();
        let key = (player_id, class);
        if let Some(&last) = dedup.get(&key) {
            if now_ms.saturating_sub(last) < DEDUP_COOLDOWN_MS {
                return false;
            }
        }
        dedup.insert(key, now_ms);
        true
    }

    /// Routes one host event, returning an XP award when a natural block
    /// break should credit the leveling consumer.
    pub fn route(&self, event: &HostEvent, now_ms: u64) -> Option<XpAward> {
        match event {
            HostEvent::EntityRemoved { player } => {
                if !self.dedup_passes(*player, EventClass::Death, now_ms) {
                    return None;
                }
                if let Some(data) = self.metabolism.snapshot(*player) {
                    if data.hunger <= self.damage_threshold || data.thirst <= self.damage_threshold || data.energy <= self.damage_threshold {
                        self.metabolism.mark_for_death_reset(*player);
                    }
                }
                None
            }
            HostEvent::KillFeed { victim } => {
                if !self.dedup_passes(*victim, EventClass::Death, now_ms) {
                    return None;
                }
                self.metabolism.mark_for_death_reset(*victim);
                None
            }
            HostEvent::AddPlayerToWorld { player } => {
                self.metabolism.reset_if_marked_for_death(*player);
                None
            }
            HostEvent::BlockPlaced { pos, .. } => {
                self.claim_blocks.record_placed(*pos);
                None
            }
            HostEvent::BlockBroken { player, pos, origin, .. } => {
                let was_player_placed = self.claim_blocks.take_if_player_placed(*pos);
                if was_player_placed || *origin == BlockOrigin::PlayerPlaced {
                    None
                } else {
                    Some(XpAward { player_id: *player, amount: 1 })
                }
            }
            _ => None,
        }
    }

    pub fn claim_block_count(&self) -> usize {
        self.claim_blocks.len()
    }
}

#[cfg(test)]
#[path = "event_router_tests.rs"]
mod tests;
