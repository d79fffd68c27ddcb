// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem-backed implementation of the Persistence Sink contract.

use crate::document::DocumentId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write document {id}: {source}")]
    Write {
        id: DocumentId,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read document {id}: {source}")]
    Read {
        id: DocumentId,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to delete document {id}: {source}")]
    Delete {
        id: DocumentId,
        #[source]
        source: std::io::Error,
    },
    #[error("document {id} is not valid JSON: {source}")]
    Corrupt {
        id: DocumentId,
        #[source]
        source: serde_json::Error,
    },
}

/// Small-document JSON store rooted at a directory on disk. `save` is
/// atomic (write `<path>.tmp`, then `rename` over the final path) so a
/// crash mid-write never corrupts the previous version.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn absolute_path(&self, id: &DocumentId) -> PathBuf {
        self.root.join(id.relative_path())
    }

    /// Load a document, returning `None` if it does not exist. A corrupt
    /// document is reported as an error rather than silently treated as
    /// missing — callers decide whether to fall back to defaults, per the
    /// repair-on-load policy for their document type.
    pub fn load<T>(&self, id: &DocumentId) -> Result<Option<T>, PersistenceError>
    where
        T: DeserializeOwned,
    {
        let path = self.absolute_path(id);
        match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map(Some)
                .map_err(|source| PersistenceError::Corrupt { id: id.clone(), source }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Read { id: id.clone(), source }),
        }
    }

    /// Atomically replace the document at `id` with `value`.
    pub fn save<T>(&self, id: &DocumentId, value: &T) -> Result<(), PersistenceError>
    where
        T: Serialize,
    {
        let path = self.absolute_path(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| PersistenceError::CreateDir {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(value).unwrap_or_default();
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|source| PersistenceError::Write { id: id.clone(), source })?;
        fs::rename(&tmp_path, &path).map_err(|source| PersistenceError::Write { id: id.clone(), source })
    }

    /// Remove a document. Deleting a document that does not exist is not an
    /// error — the end state (no document) already holds.
    pub fn delete(&self, id: &DocumentId) -> Result<(), PersistenceError> {
        let path = self.absolute_path(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistenceError::Delete { id: id.clone(), source }),
        }
    }

    /// Bulk flush of a dirty set. Each document is saved independently; one
    /// failure does not block the rest. Failures are logged at `warn` and
    /// also returned so the caller can decide whether to retry on the next
    /// periodic save.
    pub fn save_all<T>(
        &self,
        dirty: impl IntoIterator<Item = (DocumentId, T)>,
    ) -> Vec<(DocumentId, PersistenceError)>
    where
        T: Serialize,
    {
        let mut failures = Vec::new();
        for (id, value) in dirty {
            if let Err(err) = self.save(&id, &value) {
                tracing::warn!(document = %id, error = %err, "periodic save failed; will retry next interval");
                failures.push((id, err));
            }
        }
        failures
    }
}

#[cfg(test)]
#[path = "file_store_tests.rs"]
mod tests;
