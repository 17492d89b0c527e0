//! Sender public-key type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque public key identifying a transaction's signer.
///
/// The store never interprets the key beyond equality; signature
/// verification happens upstream of staging.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SenderKey(String);

impl SenderKey {
    /// Maximum length of a sender key, matching the staging schema column.
    pub const MAX_LEN: usize = 258;

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this key fits the staging schema.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.len() <= Self::MAX_LEN
    }
}

impl fmt::Display for SenderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SenderKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SenderKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
