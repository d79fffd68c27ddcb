// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! livingworld-modules: the consumer modules shipped alongside the
//! framework to prove the Module Runtime's dependency ordering against a
//! non-trivial graph — `leveling` depends on `metabolism`; `hud` depends on
//! both; `claims` stands alone. None of these implement their domain's full
//! feature set; each is deliberately thin.

mod claims;
mod hud_aggregator;
mod leveling;
mod metabolism_module;

pub use claims::ClaimsModule;
pub use hud_aggregator::{HudAggregatorModule, HudVisibilityFlags};
pub use leveling::{LevelingModule, PlayerXpData};
pub use metabolism_module::MetabolismModule;

fn now_ms() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}
