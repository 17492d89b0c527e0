//! LMDB storage backend for the txq staging store.
//!
//! Implements the `txq-store` trait using the `heed` LMDB bindings. Each
//! staging table maps to one named LMDB database keyed by big-endian tx id,
//! plus an id-counter entry in a shared `meta` database.

pub mod environment;
pub mod error;
pub mod staging;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use staging::LmdbTxStagingStore;
