// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metabolism Engine: per-player activity-modulated stat drain, food/potion
//! restoration driven by the Effect Diff Detector, and the consumable
//! poison and native-debuff state machines.

use std::collections::HashMap;

use livingworld_core::PlayerId;
use parking_lot::Mutex;
use rand::Rng;

use crate::effect_diff::{poison_tier_multiplier, DetectedEffect, EffectCategory, EffectKind, PoisonKindTier};

/// A host-reported activity snapshot for one slow tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivitySnapshot {
    pub sprinting: bool,
    pub swimming: bool,
    pub in_combat: bool,
    pub creative_mode: bool,
}

/// Drain-rate configuration for a single stat's passive drain. Unifies what
/// the source duplicated separately across native-debuff and poison
/// configuration blocks.
#[derive(Debug, Clone, Copy)]
pub struct DrainProfile {
    pub hunger_per_tick: f64,
    pub thirst_per_tick: f64,
    pub energy_per_tick: f64,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct BaseDrainRates {
    pub base: f64,
    pub sprint_bonus: f64,
    pub swim_bonus: f64,
    pub combat_bonus: f64,
    pub hunger_multiplier: f64,
    pub thirst_multiplier: f64,
    pub energy_multiplier: f64,
}

impl Default for BaseDrainRates {
    fn default() -> Self {
        Self {
            base: 0.02,
            sprint_bonus: 0.03,
            swim_bonus: 0.015,
            combat_bonus: 0.02,
            hunger_multiplier: 1.0,
            thirst_multiplier: 1.2,
            energy_multiplier: 0.8,
        }
    }
}

/// Per-stat threshold below (or at) which the host damage system should act.
/// The core never applies damage itself — it only raises the flag.
#[derive(Debug, Clone, Copy)]
pub struct DamageThresholds {
    pub hunger: f64,
    pub thirst: f64,
    pub energy: f64,
}

impl Default for DamageThresholds {
    fn default() -> Self {
        Self { hunger: 10.0, thirst: 10.0, energy: 5.0 }
    }
}

/// One per tracked player, owned exclusively by the Metabolism Engine.
/// `total_*` counters are never written back to persistence — they exist
/// only to detect farming exploits, per the source's explicit note.
#[derive(Debug, Clone)]
pub struct PlayerMetabolismData {
    pub hunger: f64,
    pub thirst: f64,
    pub energy: f64,
    pub total_hunger_depleted: f64,
    pub total_thirst_depleted: f64,
    pub total_energy_depleted: f64,
    pub total_hunger_restored: f64,
    pub total_thirst_restored: f64,
    pub total_energy_restored: f64,
    pub last_tick_time_ms: u64,
    pub damage_flagged: DamageFlags,
    pub poison: Option<PoisonState>,
    marked_for_death_reset: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DamageFlags {
    pub hunger: bool,
    pub thirst: bool,
    pub energy: bool,
}

/// The values a player's metabolism resets to on add-player-to-world after
/// a death mark. Configured per world, not hardcoded to the tracked
/// defaults.
#[derive(Debug, Clone, Copy)]
pub struct InitialStats {
    pub hunger: f64,
    pub thirst: f64,
    pub energy: f64,
}

impl Default for InitialStats {
    fn default() -> Self {
        Self { hunger: 100.0, thirst: 100.0, energy: 100.0 }
    }
}

impl Default for PlayerMetabolismData {
    fn default() -> Self {
        Self {
            hunger: 100.0,
            thirst: 100.0,
            energy: 100.0,
            total_hunger_depleted: 0.0,
            total_thirst_depleted: 0.0,
            total_energy_depleted: 0.0,
            total_hunger_restored: 0.0,
            total_thirst_restored: 0.0,
            total_energy_restored: 0.0,
            last_tick_time_ms: 0,
            damage_flagged: DamageFlags::default(),
            poison: None,
            marked_for_death_reset: false,
        }
    }
}

impl PlayerMetabolismData {
    pub fn is_marked_for_death_reset(&self) -> bool {
        self.marked_for_death_reset
    }

    pub fn mark_for_death_reset(&mut self) {
        self.marked_for_death_reset = true;
    }

    /// Resets metabolism to `initial`, as invoked when the host signals
    /// add-player-to-world after a death mark. Depleted/restored counters
    /// and poison state are cleared along with it; the tick clock is kept.
    pub fn reset_to_initial(&mut self, initial: InitialStats) {
        let reset_at = self.last_tick_time_ms;
        *self = Self::default();
        self.hunger = initial.hunger;
        self.thirst = initial.thirst;
        self.energy = initial.energy;
        self.last_tick_time_ms = reset_at;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoisonKind {
    MildToxin,
    SlowPoison,
    Purge,
}

#[derive(Debug, Clone, Copy)]
pub struct PoisonConfig {
    pub mild_toxin: DrainProfile,
    pub mild_toxin_duration_ms: u64,
    pub slow_poison: DrainProfile,
    pub slow_poison_duration_ms: u64,
    pub purge_drain: DrainProfile,
    pub purge_drain_duration_ms: u64,
    pub purge_recovery_duration_ms: u64,
}

impl Default for PoisonConfig {
    fn default() -> Self {
        Self {
            mild_toxin: DrainProfile { hunger_per_tick: 0.5, thirst_per_tick: 0.3, energy_per_tick: 0.2, interval_ms: 1000 },
            mild_toxin_duration_ms: 10_000,
            slow_poison: DrainProfile { hunger_per_tick: 0.15, thirst_per_tick: 0.1, energy_per_tick: 0.05, interval_ms: 1000 },
            slow_poison_duration_ms: 30_000,
            purge_drain: DrainProfile { hunger_per_tick: 2.0, thirst_per_tick: 1.5, energy_per_tick: 1.0, interval_ms: 1000 },
            purge_drain_duration_ms: 6_000,
            purge_recovery_duration_ms: 8_000,
        }
    }
}

/// Consumable poison state machine. `kind` is resolved uniformly at random
/// from `RANDOM` on apply; once resolved it never changes for the lifetime
/// of the state.
#[derive(Debug, Clone)]
pub struct PoisonState {
    pub kind: PoisonKind,
    pub start_time_ms: u64,
    pub duration_ms: u64,
    pub last_tick_time_ms: u64,
    pub ticks_applied: u64,
    pub in_recovery_phase: bool,
}

impl PoisonState {
    /// Resolves `RANDOM` to a concrete kind and starts the state's clock.
    pub fn apply(now_ms: u64, cfg: &PoisonConfig, rng: &mut impl Rng) -> Self {
        let kind = match rng.gen_range(0..3) {
            0 => PoisonKind::MildToxin,
            1 => PoisonKind::SlowPoison,
            _ => PoisonKind::Purge,
        };
        let duration_ms = match kind {
            PoisonKind::MildToxin => cfg.mild_toxin_duration_ms,
            PoisonKind::SlowPoison => cfg.slow_poison_duration_ms,
            PoisonKind::Purge => cfg.purge_drain_duration_ms + cfg.purge_recovery_duration_ms,
        };
        Self { kind, start_time_ms: now_ms, duration_ms, last_tick_time_ms: now_ms, ticks_applied: 0, in_recovery_phase: false }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.start_time_ms) > self.duration_ms
    }

    /// Advances the state machine by one tick, returning the drain to apply
    /// this tick (zero during PURGE's recovery phase).
    pub fn tick(&mut self, now_ms: u64, cfg: &PoisonConfig) -> DrainProfile {
        let zero = DrainProfile { hunger_per_tick: 0.0, thirst_per_tick: 0.0, energy_per_tick: 0.0, interval_ms: 0 };
        match self.kind {
            PoisonKind::MildToxin => {
                if now_ms.saturating_sub(self.last_tick_time_ms) < cfg.mild_toxin.interval_ms {
                    return zero;
                }
                self.last_tick_time_ms = now_ms;
                self.ticks_applied += 1;
                cfg.mild_toxin
            }
            PoisonKind::SlowPoison => {
                if now_ms.saturating_sub(self.last_tick_time_ms) < cfg.slow_poison.interval_ms {
                    return zero;
                }
                self.last_tick_time_ms = now_ms;
                self.ticks_applied += 1;
                cfg.slow_poison
            }
            PoisonKind::Purge => {
                if self.in_recovery_phase {
                    // Recovery is a no-op window matching the source's
                    // actual behavior — a "faster metabolism" bonus the
                    // comment promised was never implemented there either.
                    return zero;
                }
                if now_ms.saturating_sub(self.start_time_ms) > cfg.purge_drain_duration_ms {
                    self.in_recovery_phase = true;
                    return zero;
                }
                if now_ms.saturating_sub(self.last_tick_time_ms) < cfg.purge_drain.interval_ms {
                    return zero;
                }
                self.last_tick_time_ms = now_ms;
                self.ticks_applied += 1;
                cfg.purge_drain
            }
        }
    }
}

const HUNGER_BY_TIER: [f64; 4] = [0.0, 8.0, 16.0, 24.0];
const THIRST_BY_TIER: [f64; 4] = [0.0, 8.0, 16.0, 24.0];
const ENERGY_BY_TIER: [f64; 4] = [0.0, 6.0, 12.0, 18.0];

struct KindMultiplier {
    hunger: f64,
    thirst: f64,
    energy: f64,
}

fn kind_multiplier(kind: EffectKind) -> KindMultiplier {
    match kind {
        EffectKind::Meat => KindMultiplier { hunger: 1.3, thirst: 0.5, energy: 1.0 },
        EffectKind::FruitVeggie => KindMultiplier { hunger: 0.9, thirst: 1.5, energy: 1.0 },
        EffectKind::Bread => KindMultiplier { hunger: 1.1, thirst: 0.8, energy: 1.0 },
        EffectKind::HealthPotion => KindMultiplier { hunger: 0.3, thirst: 2.0, energy: 0.0 },
        EffectKind::ManaPotion => KindMultiplier { hunger: 0.0, thirst: 2.0, energy: 0.3 },
        EffectKind::StaminaPotion => KindMultiplier { hunger: 0.2, thirst: 1.0, energy: 1.5 },
        EffectKind::Water => KindMultiplier { hunger: 0.0, thirst: 2.5, energy: 0.0 },
        EffectKind::Milk => KindMultiplier { hunger: 0.2, thirst: 1.2, energy: 0.2 },
        EffectKind::InstantHeal => KindMultiplier { hunger: 0.4, thirst: 0.4, energy: 0.0 },
        EffectKind::HealthRegen => KindMultiplier { hunger: 0.5, thirst: 0.2, energy: 0.0 },
        EffectKind::StaminaBoost => KindMultiplier { hunger: 0.2, thirst: 0.2, energy: 1.4 },
        EffectKind::HealthBoost => KindMultiplier { hunger: 0.6, thirst: 0.3, energy: 0.0 },
        _ => KindMultiplier { hunger: 1.0, thirst: 1.0, energy: 1.0 },
    }
}

/// The result of applying one restoration, for notification dispatch.
#[derive(Debug, Clone, Copy)]
pub struct RestorationResult {
    pub hunger_delta: f64,
    pub thirst_delta: f64,
    pub energy_delta: f64,
}

#[derive(Debug, Clone, Copy)]
struct DebuffTrack {
    last_tick_time_ms: u64,
}

/// Drives both the fast (~50 ms) and slow (1-2 s) ticks over tracked
/// players. Per-player data lives behind a mutex taken for the duration of
/// a multi-field update and released before any world-thread dispatch.
pub struct MetabolismEngine {
    players: Mutex<HashMap<PlayerId, PlayerMetabolismData>>,
    debuff_tracks: Mutex<HashMap<(PlayerId, &'static str), DebuffTrack>>,
    rates: BaseDrainRates,
    thresholds: DamageThresholds,
    poison_cfg: PoisonConfig,
    initial: InitialStats,
    debuff_profiles: HashMap<&'static str, DrainProfile>,
}

impl MetabolismEngine {
    pub fn new(rates: BaseDrainRates, thresholds: DamageThresholds, poison_cfg: PoisonConfig) -> Self {
        Self::with_initial_stats(rates, thresholds, poison_cfg, InitialStats::default())
    }

    /// As [`MetabolismEngine::new`], but with a world-configured reset
    /// target instead of the tracked-player default.
    pub fn with_initial_stats(rates: BaseDrainRates, thresholds: DamageThresholds, poison_cfg: PoisonConfig, initial: InitialStats) -> Self {
        let mut debuff_profiles = HashMap::new();
        debuff_profiles.insert("burn", DrainProfile { hunger_per_tick: 0.0, thirst_per_tick: 0.4, energy_per_tick: 0.2, interval_ms: 1000 });
        debuff_profiles.insert("freeze", DrainProfile { hunger_per_tick: 0.1, thirst_per_tick: 0.1, energy_per_tick: 0.4, interval_ms: 1000 });
        debuff_profiles.insert("stun", DrainProfile { hunger_per_tick: 0.0, thirst_per_tick: 0.0, energy_per_tick: 0.3, interval_ms: 1000 });
        debuff_profiles.insert("slow", DrainProfile { hunger_per_tick: 0.1, thirst_per_tick: 0.0, energy_per_tick: 0.2, interval_ms: 1000 });
        debuff_profiles.insert("root", DrainProfile { hunger_per_tick: 0.1, thirst_per_tick: 0.0, energy_per_tick: 0.1, interval_ms: 1000 });
        Self {
            players: Mutex::new(HashMap::new()),
            debuff_tracks: Mutex::new(HashMap::new()),
            rates,
            thresholds,
            poison_cfg,
            initial,
            debuff_profiles,
        }
    }

    pub fn track_player(&self, player_id: PlayerId, now_ms: u64) {
        self.players.lock().entry(player_id).or_insert_with(|| PlayerMetabolismData { last_tick_time_ms: now_ms, ..Default::default() });
    }

    pub fn untrack_player(&self, player_id: PlayerId) {
        self.players.lock().remove(&player_id);
        self.debuff_tracks.lock().retain(|(p, _), _| *p != player_id);
    }

    pub fn snapshot(&self, player_id: PlayerId) -> Option<PlayerMetabolismData> {
        self.players.lock().get(&player_id).cloned()
    }

    /// Marks `player_id` for a metabolism-death reset on its next
    /// add-player-to-world event, per the Event Router's death path.
    pub fn mark_for_death_reset(&self, player_id: PlayerId) {
        if let Some(data) = self.players.lock().get_mut(&player_id) {
            data.mark_for_death_reset();
        }
    }

    /// Resets `player_id`'s metabolism to its initial values if (and only
    /// if) it was previously marked for a death reset.
    pub fn reset_if_marked_for_death(&self, player_id: PlayerId) {
        if let Some(data) = self.players.lock().get_mut(&player_id) {
            if data.is_marked_for_death_reset() {
                data.reset_to_initial(self.initial);
            }
        }
    }

    /// Force-sets a tracked player's stats. Only for test setup — the
    /// engine never exposes a way to write these fields directly in
    /// production; real changes always go through drain or restoration.
    #[cfg(any(test, feature = "test-support"))]
    pub fn test_set_stats(&self, player_id: PlayerId, hunger: f64, thirst: f64, energy: f64) {
        if let Some(data) = self.players.lock().get_mut(&player_id) {
            data.hunger = hunger;
            data.thirst = thirst;
            data.energy = energy;
        }
    }

    /// Slow tick: activity-modulated passive drain, consumable-poison drain,
    /// and native-debuff rate-limited drain for the debuff kinds currently
    /// active on `player_id` (as reported by
    /// [`crate::EffectDiffDetector::active_debuff_kinds`]). Skipped entirely
    /// for players in creative mode.
    pub fn slow_tick(&self, player_id: PlayerId, now_ms: u64, activity: ActivitySnapshot, active_debuff_kinds: &[(&'static str, u8)]) {
        if activity.creative_mode {
            return;
        }
        let mut players = self.players.lock();
        let Some(data) = players.get_mut(&player_id) else { return };

        let delta_seconds = now_ms.saturating_sub(data.last_tick_time_ms) as f64 / 1000.0;
        data.last_tick_time_ms = now_ms;

        let rate = self.rates.base
            + self.rates.sprint_bonus * (activity.sprinting as u8 as f64)
            + self.rates.swim_bonus * (activity.swimming as u8 as f64)
            + self.rates.combat_bonus * (activity.in_combat as u8 as f64);

        let hunger_drain = rate * self.rates.hunger_multiplier * delta_seconds;
        let thirst_drain = rate * self.rates.thirst_multiplier * delta_seconds;
        let energy_drain = rate * self.rates.energy_multiplier * delta_seconds;

        data.hunger = (data.hunger - hunger_drain).clamp(0.0, 100.0);
        data.thirst = (data.thirst - thirst_drain).clamp(0.0, 100.0);
        data.energy = (data.energy - energy_drain).clamp(0.0, 100.0);

        data.total_hunger_depleted += hunger_drain;
        data.total_thirst_depleted += thirst_drain;
        data.total_energy_depleted += energy_drain;

        data.damage_flagged.hunger = data.hunger <= self.thresholds.hunger;
        data.damage_flagged.thirst = data.thirst <= self.thresholds.thirst;
        data.damage_flagged.energy = data.energy <= self.thresholds.energy;

        self.tick_poison(data, now_ms);
        self.tick_native_debuffs(player_id, data, now_ms, active_debuff_kinds);
    }

    fn tick_poison(&self, data: &mut PlayerMetabolismData, now_ms: u64) {
        let Some(poison) = data.poison.as_mut() else { return };
        if poison.is_expired(now_ms) {
            data.poison = None;
            return;
        }
        let drain = poison.tick(now_ms, &self.poison_cfg);
        data.hunger = (data.hunger - drain.hunger_per_tick).clamp(0.0, 100.0);
        data.thirst = (data.thirst - drain.thirst_per_tick).clamp(0.0, 100.0);
        data.energy = (data.energy - drain.energy_per_tick).clamp(0.0, 100.0);
    }

    /// Native-debuff drain: a per-(player, kind) last-tick timestamp
    /// enforces each kind's own interval; entries not present in
    /// `active_debuff_kinds` this tick are evicted.
    fn tick_native_debuffs(
        &self,
        player_id: PlayerId,
        data: &mut PlayerMetabolismData,
        now_ms: u64,
        active_debuff_kinds: &[(&'static str, u8)],
    ) {
        let mut tracks = self.debuff_tracks.lock();
        tracks.retain(|(p, kind), _| *p != player_id || active_debuff_kinds.iter().any(|(k, _)| k == kind));

        for (kind, tier) in active_debuff_kinds {
            let Some(profile) = self.debuff_profiles.get(kind).copied() else { continue };
            let track = tracks.entry((player_id, kind)).or_insert(DebuffTrack { last_tick_time_ms: now_ms });
            if now_ms.saturating_sub(track.last_tick_time_ms) < profile.interval_ms {
                continue;
            }
            track.last_tick_time_ms = now_ms;
            let mult = poison_tier_multiplier(*tier);
            data.hunger = (data.hunger - profile.hunger_per_tick * mult).clamp(0.0, 100.0);
            data.thirst = (data.thirst - profile.thirst_per_tick * mult).clamp(0.0, 100.0);
            data.energy = (data.energy - profile.energy_per_tick * mult).clamp(0.0, 100.0);
        }
    }

    /// Applies one restoration from a newly-detected food/potion effect.
    /// Returns the actual delta applied, clamped so no stat exceeds 100.
    pub fn apply_effect(&self, effect: &DetectedEffect) -> Option<RestorationResult> {
        if effect.category == EffectCategory::Debuff {
            let mut players = self.players.lock();
            let data = players.get_mut(&effect.player_id)?;
            if let EffectKind::Poison(PoisonKindTier(_)) = effect.kind {
                data.poison = Some(PoisonState::apply(data.last_tick_time_ms, &self.poison_cfg, &mut rand::thread_rng()));
            }
            return None;
        }

        let tier = effect.tier.clamp(1, 3) as usize;
        let mult = kind_multiplier(effect.kind);
        let base_hunger = HUNGER_BY_TIER[tier] * mult.hunger;
        let base_thirst = THIRST_BY_TIER[tier] * mult.thirst;
        let base_energy = ENERGY_BY_TIER[tier] * mult.energy;

        let mut players = self.players.lock();
        let data = players.get_mut(&effect.player_id)?;

        let hunger_delta = (100.0 - data.hunger).min(base_hunger).max(0.0);
        let thirst_delta = (100.0 - data.thirst).min(base_thirst).max(0.0);
        let energy_delta = (100.0 - data.energy).min(base_energy).max(0.0);

        data.hunger += hunger_delta;
        data.thirst += thirst_delta;
        data.energy += energy_delta;
        data.total_hunger_restored += hunger_delta;
        data.total_thirst_restored += thirst_delta;
        data.total_energy_restored += energy_delta;

        Some(RestorationResult { hunger_delta, thirst_delta, energy_delta })
    }
}

#[cfg(test)]
#[path = "metabolism_tests.rs"]
mod tests;
