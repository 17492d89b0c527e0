//! Abstract storage trait for the txq staging store.
//!
//! Every storage backend (LMDB, in-memory for testing) implements
//! [`TxStagingStore`]. The rest of the codebase depends only on the trait.

pub mod error;
pub mod record;
pub mod staging;

pub use error::StoreError;
pub use record::StagedTx;
pub use staging::TxStagingStore;
