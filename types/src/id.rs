//! Store-assigned transaction identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned to a transaction when it is staged.
///
/// Assigned by the storage backend in strictly increasing order of
/// insertion and never reused after deletion, so it doubles as an
/// insertion-order ("age") marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxId(u64);

impl TxId {
    /// The identifier given to the first record staged in a fresh table.
    pub const FIRST: Self = Self(1);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The identifier that follows this one.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
