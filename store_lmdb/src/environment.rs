//! LMDB environment setup and staging-table lifecycle.

use std::path::Path;
use std::sync::Arc;

use heed::byteorder::BigEndian;
use heed::types::{Bytes, U64};
use heed::{Env, EnvOpenOptions};

use txq_store::StoreError;

use crate::staging::LmdbTxStagingStore;
use crate::LmdbError;

/// Key codec for staging tables: the tx id, big-endian so that LMDB's
/// lexicographic key order is numeric insertion order.
pub(crate) type IdCodec = U64<BigEndian>;

/// Name of the shared metadata database holding per-table id counters.
const META_DB_NAME: &str = "meta";

/// Wraps the LMDB environment and the shared metadata database.
///
/// One environment can host several staging tables (one named database
/// each); tests use a fresh table name per test, mirroring how the service
/// provisions one table per deployment.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    pub(crate) meta_db: heed::Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// `max_dbs` must cover every staging table plus the metadata database.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, StoreError> {
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)
                .map_err(LmdbError::from)?
        };
        let mut wtxn = env.write_txn().map_err(LmdbError::from)?;
        let meta_db = env
            .create_database::<Bytes, Bytes>(&mut wtxn, Some(META_DB_NAME))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(Self {
            env: Arc::new(env),
            meta_db,
        })
    }

    /// Access the raw heed environment.
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Idempotently create the named staging table and return a store
    /// handle for it. Existing data is left untouched.
    pub fn staging_store(&self, name: &str) -> Result<LmdbTxStagingStore, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let db = self
            .env
            .create_database::<IdCodec, Bytes>(&mut wtxn, Some(name))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(LmdbTxStagingStore::new(
            Arc::clone(&self.env),
            db,
            self.meta_db,
            name,
        ))
    }

    /// Idempotently tear down the named staging table: empty it and delete
    /// its id counter, so a re-created table assigns ids from 1 again.
    ///
    /// Teardown/reset only, never in steady-state operation.
    pub fn drop_staging_store(&self, name: &str) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let db = self
            .env
            .open_database::<IdCodec, Bytes>(&wtxn, Some(name))
            .map_err(LmdbError::from)?;
        if let Some(db) = db {
            db.clear(&mut wtxn).map_err(LmdbError::from)?;
        }
        self.meta_db
            .delete(&mut wtxn, LmdbTxStagingStore::counter_key(name).as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
