// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effect Diff Detector: snapshots the host's active-effect set per player
//! per tick and emits only newly-applied effects, suppressing re-emission
//! of the same index within a cool-down window.

use std::collections::{HashMap, HashSet};

use livingworld_core::PlayerId;
use livingworld_host::ActiveEffect;

/// Default window during which an already-processed effect index is
/// suppressed from re-emission, even after it drops out of `previous`.
pub const CLEANUP_INTERVAL_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectCategory {
    Food,
    Potion,
    Debuff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    HealthPotion,
    StaminaPotion,
    ManaPotion,
    Water,
    Milk,
    Meat,
    FruitVeggie,
    Bread,
    InstantHeal,
    HealthRegen,
    StaminaBoost,
    HealthBoost,
    Generic,
    Poison(PoisonKindTier),
    Burn,
    Stun,
    Freeze,
    Root,
    Slow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoisonKindTier(pub u8);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedEffect {
    pub player_id: PlayerId,
    pub index: u32,
    pub id: String,
    pub tier: u8,
    pub kind: EffectKind,
    pub category: EffectCategory,
}

/// Tier derivation from the resolved asset ID string: explicit `_T{1,2,3}`
/// suffix wins, then size words, then quality words, defaulting to 2.
pub fn derive_tier(id: &str) -> u8 {
    if id.ends_with("_T1") {
        return 1;
    }
    if id.ends_with("_T2") {
        return 2;
    }
    if id.ends_with("_T3") {
        return 3;
    }
    if id.contains("_Tiny") || id.contains("_Small") {
        return 1;
    }
    if id.contains("_Medium") {
        return 2;
    }
    if id.contains("_Large") {
        return 3;
    }
    if id.contains("_Lesser") {
        return 1;
    }
    if id.contains("_Greater") {
        return 3;
    }
    2
}

/// Kind derivation over food/potion IDs. First matching rule wins, in the
/// order listed below.
pub fn derive_kind(id: &str) -> Option<EffectKind> {
    if id.starts_with("Potion_Health") || id.starts_with("Potion_Regen_Health") {
        return Some(EffectKind::HealthPotion);
    }
    if id.starts_with("Potion_Stamina") {
        return Some(EffectKind::StaminaPotion);
    }
    if id.starts_with("Potion_Signature") || id.starts_with("Potion_Mana") || id.starts_with("Potion_Morph") {
        return Some(EffectKind::ManaPotion);
    }
    if id.starts_with("Food_Health_Restore") {
        return Some(EffectKind::Water);
    }
    if id == "Antidote" {
        return Some(EffectKind::Milk);
    }
    if id.contains("Meat") {
        return Some(EffectKind::Meat);
    }
    if id.contains("Fruit") || id.contains("Veggie") {
        return Some(EffectKind::FruitVeggie);
    }
    if id.contains("Bread") {
        return Some(EffectKind::Bread);
    }
    if id.contains("Instant_Heal") {
        return Some(EffectKind::InstantHeal);
    }
    if id.contains("Health_Regen") {
        return Some(EffectKind::HealthRegen);
    }
    if id.contains("Stamina_Regen") {
        return Some(EffectKind::StaminaBoost);
    }
    if id.contains("Health_Boost") {
        return Some(EffectKind::HealthBoost);
    }
    if id.contains("Stamina_Boost") {
        return Some(EffectKind::StaminaBoost);
    }
    Some(EffectKind::Generic)
}

/// Separate classification pass for native debuffs, keyed off a disjoint
/// prefix map from the food/potion one.
pub fn derive_debuff_kind(id: &str) -> Option<EffectKind> {
    let tier = derive_tier(id);
    if id.starts_with("Poison") {
        return Some(EffectKind::Poison(PoisonKindTier(tier)));
    }
    if id.starts_with("Burn") {
        return Some(EffectKind::Burn);
    }
    if id.starts_with("Stun") {
        return Some(EffectKind::Stun);
    }
    if id.starts_with("Freeze") {
        return Some(EffectKind::Freeze);
    }
    if id.starts_with("Root") {
        return Some(EffectKind::Root);
    }
    if id.starts_with("Slow") {
        return Some(EffectKind::Slow);
    }
    None
}

/// Poison tier drain multipliers, per `derive_debuff_kind`'s tier.
pub fn poison_tier_multiplier(tier: u8) -> f64 {
    match tier {
        1 => 0.75,
        3 => 1.5,
        _ => 1.0,
    }
}

/// Maps a native-debuff `EffectKind` to the static key the Metabolism
/// Engine's per-(player, kind) drain tracking is keyed on. `Poison` is
/// excluded — it drives the consumable `PoisonState` machine instead of the
/// native-debuff rate-limited drain.
pub fn debuff_drain_key(kind: EffectKind) -> Option<&'static str> {
    match kind {
        EffectKind::Burn => Some("burn"),
        EffectKind::Freeze => Some("freeze"),
        EffectKind::Stun => Some("stun"),
        EffectKind::Root => Some("root"),
        EffectKind::Slow => Some("slow"),
        _ => None,
    }
}

struct PerPlayerState {
    previous_indices: HashSet<u32>,
    processed_indices: HashMap<u32, u64>,
    last_cleanup_ms: u64,
    /// Native-debuff kinds active as of the most recent `diff_tick` call,
    /// recomputed every call regardless of whether the effect was newly
    /// detected this tick or still ongoing from a previous one.
    active_debuffs: Vec<(&'static str, u8)>,
}

impl PerPlayerState {
    fn new(now_ms: u64) -> Self {
        Self { previous_indices: HashSet::new(), processed_indices: HashMap::new(), last_cleanup_ms: now_ms, active_debuffs: Vec::new() }
    }
}

/// Per-player active-effect snapshot and diff machinery. Resolving a host
/// index to a string id must happen on the world thread; this struct itself
/// holds no host handles and can be mutated off-thread.
pub struct EffectDiffDetector {
    players: HashMap<PlayerId, PerPlayerState>,
    cleanup_interval_ms: u64,
}

impl Default for EffectDiffDetector {
    fn default() -> Self {
        Self::new(CLEANUP_INTERVAL_MS)
    }
}

impl EffectDiffDetector {
    pub fn new(cleanup_interval_ms: u64) -> Self {
        Self { players: HashMap::new(), cleanup_interval_ms }
    }

    /// Feeds one tick's worth of `(index, resolved_id)` pairs for `player`
    /// and returns the effects newly detected this tick. As a side effect,
    /// refreshes the player's currently-active native-debuff kinds, which
    /// [`EffectDiffDetector::active_debuff_kinds`] exposes for the
    /// Metabolism Engine's rate-limited drain — unlike food/potion
    /// detections, debuff drain must keep running for as long as the effect
    /// stays active, not just on the tick it first appears.
    pub fn diff_tick(
        &mut self,
        player_id: PlayerId,
        now_ms: u64,
        active: &[ActiveEffect],
        resolve: impl Fn(u32) -> Option<String>,
    ) -> Vec<DetectedEffect> {
        let state = self.players.entry(player_id).or_insert_with(|| PerPlayerState::new(now_ms));

        if now_ms.saturating_sub(state.last_cleanup_ms) >= self.cleanup_interval_ms {
            state.processed_indices.clear();
            state.last_cleanup_ms = now_ms;
        }

        let mut detected = Vec::new();
        let mut current = HashSet::with_capacity(active.len());
        let mut active_debuffs = Vec::new();

        for effect in active {
            current.insert(effect.index);
            let is_new = !state.previous_indices.contains(&effect.index) && !state.processed_indices.contains_key(&effect.index);

            if effect.is_debuff {
                let Some(id) = resolve(effect.index) else { continue };
                let Some(kind) = derive_debuff_kind(&id) else { continue };
                if let Some(key) = debuff_drain_key(kind) {
                    active_debuffs.push((key, derive_tier(&id)));
                }
                if is_new {
                    let tier = derive_tier(&id);
                    detected.push(DetectedEffect { player_id, index: effect.index, id, tier, kind, category: EffectCategory::Debuff });
                    state.processed_indices.insert(effect.index, now_ms);
                }
                continue;
            }

            if !is_new {
                continue;
            }
            let Some(id) = resolve(effect.index) else { continue };
            let Some(kind) = derive_kind(&id) else { continue };
            let category = if id.starts_with("Potion") { EffectCategory::Potion } else { EffectCategory::Food };
            let tier = derive_tier(&id);
            detected.push(DetectedEffect { player_id, index: effect.index, id, tier, kind, category });
            state.processed_indices.insert(effect.index, now_ms);
        }

        state.previous_indices = current;
        state.active_debuffs = active_debuffs;
        detected
    }

    /// The native-debuff kinds active as of the most recent `diff_tick` call
    /// for `player_id`, as `(kind_key, tier)` pairs ready to feed the
    /// Metabolism Engine's rate-limited drain. Empty if the player has never
    /// been diffed or has no active debuffs.
    pub fn active_debuff_kinds(&self, player_id: PlayerId) -> Vec<(&'static str, u8)> {
        self.players.get(&player_id).map(|s| s.active_debuffs.clone()).unwrap_or_default()
    }

    pub fn forget_player(&mut self, player_id: PlayerId) {
        self.players.remove(&player_id);
    }
}

#[cfg(test)]
#[path = "effect_diff_tests.rs"]
mod tests;
