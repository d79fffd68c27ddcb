// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single-simulation-thread dispatcher.
//!
//! `execute` is fire-and-forget: it returns immediately without awaiting
//! completion, and the submitted closure may never run if the world shuts
//! down first. Callers must not layer a future/promise abstraction on top —
//! see `spec.md` §9's "fire-and-forget execute_on_world" redesign note.

/// Runs closures on the host's single simulation thread. Any read or write
/// through an `EntityRef`, `EntityStore`, or `EffectController` must happen
/// inside a job submitted here.
pub trait WorldDispatcher: Send + Sync {
    /// Submit `job` to run on the world thread. Returns `true` if the job
    /// was accepted for execution, `false` if the dispatcher is shutting
    /// down and the job was dropped. A `true` return is not a completion
    /// guarantee — only an acceptance guarantee.
    fn execute(&self, job: Box<dyn FnOnce() + Send>) -> bool;
}
