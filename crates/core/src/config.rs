// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON configuration loading shared by the Module Runtime and the
//! top-level `modules.json` enablement map.
//!
//! Contract: creates the file with defaults on first run; on parse failure,
//! returns the default and logs a warning — it never overwrites whatever is
//! already on disk, since a bad parse might just mean the host is mid-edit.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to create config directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Load a JSON config document at `path`, creating it with `default()` if
/// missing. On parse failure the default is returned (and logged) without
/// touching the file on disk.
pub fn load_or_init<T>(path: &Path, default: impl FnOnce() -> T) -> Result<T, ConfigError>
where
    T: Serialize + DeserializeOwned,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.display().to_string(),
            source,
        })?;
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<T>(&contents) {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "config file failed to parse; using defaults without overwriting it"
                );
                Ok(default())
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let value = default();
            write_pretty(path, &value)?;
            Ok(value)
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to read config file; using defaults");
            Ok(default())
        }
    }
}

/// Pretty-print `value` as JSON to `path`, creating parent directories as
/// needed. Used for first-run defaults and explicit module config saves.
pub fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.display().to_string(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(value).unwrap_or_default();
    fs::write(path, json).map_err(|source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
