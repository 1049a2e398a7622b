use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CredentialError {
    #[error("credential pool needs at least one non-empty API key")]
    Empty,
}

/// Round-robin pool of provider API keys.
///
/// The cursor only moves forward, one step per `next()`, wrapping at the end
/// of the list. It is shared process-wide behind an `Arc`.
pub struct CredentialPool {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    /// Builds a pool from the given keys, skipping blank entries.
    pub fn new(keys: impl IntoIterator<Item = String>) -> Result<Self, CredentialError> {
        let keys: Vec<String> = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keys.is_empty() {
            return Err(CredentialError::Empty);
        }

        Ok(Self {
            keys,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn current_index(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    pub fn current(&self) -> &str {
        &self.keys[self.current_index()]
    }

    /// Advances to the next key (wrap-around) and returns it.
    pub fn next(&self) -> &str {
        let len = self.keys.len();
        let previous = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| Some((i + 1) % len))
            .unwrap_or_else(|i| i);
        &self.keys[(previous + 1) % len]
    }
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPool")
            .field("keys", &self.keys.len())
            .field("cursor", &self.current_index())
            .finish()
    }
}
