// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn player_id_roundtrips_through_json() {
    let id = PlayerId::new(Uuid::from_u128(42));
    let json = serde_json::to_string(&id).unwrap();
    let back: PlayerId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, back);
}

#[test]
fn module_id_compares_against_str() {
    let id = ModuleId::new("metabolism");
    assert_eq!(id, *"metabolism");
    assert_eq!(id.as_str(), "metabolism");
}

#[test]
fn module_id_usable_as_hashmap_key_by_str() {
    use std::collections::HashMap;
    let mut map: HashMap<ModuleId, u32> = HashMap::new();
    map.insert(ModuleId::new("claims"), 1);
    assert_eq!(map.get("claims"), Some(&1));
}
