//! Fundamental types for the txq staging store.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: transaction identifiers, sender keys, and timestamps.

pub mod id;
pub mod sender;
pub mod time;

pub use id::TxId;
pub use sender::SenderKey;
pub use time::Timestamp;
