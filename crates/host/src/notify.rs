// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module Host Services' notification dispatcher: title/subtitle display,
//! sound playback, and chat send, with color preset helpers. Every call is
//! routed through [`crate::WorldDispatcher::execute`] by the caller; this
//! trait itself only describes the shape of the request.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Semantic color presets a consumer module picks instead of a raw color
/// value — keeps modules from hard-coding hex codes for common outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    Success,
    Warn,
    Error,
    Info,
    Unlock,
}

impl NotifyKind {
    /// Hex color (without `#`) associated with this preset.
    pub fn color(self) -> &'static str {
        match self {
            NotifyKind::Success => "55FF55",
            NotifyKind::Warn => "FFAA00",
            NotifyKind::Error => "FF5555",
            NotifyKind::Info => "55FFFF",
            NotifyKind::Unlock => "AA00AA",
        }
    }
}

/// Dispatches player-facing notifications on behalf of consumer modules.
/// Implementations must suppress and log exceptions from the underlying
/// host call rather than propagate them — a failed notification is never
/// allowed to abort the caller's tick.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Display a title/subtitle overlay to `player`, colored per `kind`.
    async fn title(&self, player: livingworld_core::PlayerId, title: &str, subtitle: &str, kind: NotifyKind) -> Result<(), NotifyError>;

    /// Play a named sound effect for `player`.
    async fn sound(&self, player: livingworld_core::PlayerId, sound_id: &str) -> Result<(), NotifyError>;

    /// Send a chat message to `player`, colored per `kind`.
    async fn chat(&self, player: livingworld_core::PlayerId, message: &str, kind: NotifyKind) -> Result<(), NotifyError>;
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
