//! Checked-code set — which codes have already been probed, across runs.
//!
//! Persisted as a flat JSON array of strings, loaded at startup and
//! overwritten at shutdown. At runtime the set is shared across all probe
//! workers behind a mutex; membership is monotonic within a process
//! lifetime (codes are added, never removed).
//!
//! A code is marked checked *before* its probe completes, so a timed-out or
//! failed probe still counts as checked and will never be retried in a
//! later run unless the state file is edited. That at-most-once policy is
//! deliberate.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

/// Errors loading or saving the checked-code state file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read or write checked-code file")]
    Io(#[from] io::Error),
    #[error("checked-code file is not a JSON array of strings")]
    Json(#[from] serde_json::Error),
}

/// Thread-safe set of already-probed codes.
///
/// Cloning is cheap and shares the underlying set.
#[derive(Debug, Clone, Default)]
pub struct CheckedSet {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl CheckedSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the set from a JSON array file. A missing file is not an error
    /// and yields an empty set; a present-but-corrupt file is.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };
        let codes: Vec<String> = serde_json::from_str(&raw)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(codes.into_iter().collect())),
        })
    }

    /// Overwrite the state file with the current set, in arbitrary order.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let codes: Vec<String> = self.guard().iter().cloned().collect();
        let raw = serde_json::to_string(&codes)?;
        fs::write(path, raw)?;
        Ok(())
    }

    /// Mark a code as checked. Returns `true` if the code was not already
    /// present. Lookup and insert happen under one lock, so concurrent
    /// probes of duplicate codes race safely: exactly one caller wins.
    pub fn mark(&self, code: &str) -> bool {
        self.guard().insert(code.to_string())
    }

    /// Whether a code has already been checked.
    pub fn contains(&self, code: &str) -> bool {
        self.guard().contains(code)
    }

    /// Number of checked codes.
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Whether no codes have been checked.
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    fn guard(&self) -> MutexGuard<'_, HashSet<String>> {
        // No code path panics while holding the lock, so a poisoned mutex
        // still contains a consistent set.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
