//! LMDB implementation of TxStagingStore.
//!
//! Records are stored keyed by big-endian tx id, so LMDB's key order is
//! insertion order: `first` is a cursor read and `clear_before_id` is a
//! single range delete. The next id lives in the shared `meta` database
//! under `<table>/next_tx_id` and is read and bumped inside the same write
//! transaction as the inserts, so ids stay unique and increasing across
//! concurrent producers (LMDB serializes writers) and are never reused
//! after deletion.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use txq_store::{StagedTx, StoreError, TxStagingStore};
use txq_types::{SenderKey, TxId};

use crate::environment::IdCodec;
use crate::LmdbError;

pub struct LmdbTxStagingStore {
    env: Arc<Env>,
    db: Database<IdCodec, Bytes>,
    meta_db: Database<Bytes, Bytes>,
    counter_key: String,
}

impl LmdbTxStagingStore {
    pub(crate) fn new(
        env: Arc<Env>,
        db: Database<IdCodec, Bytes>,
        meta_db: Database<Bytes, Bytes>,
        name: &str,
    ) -> Self {
        Self {
            env,
            db,
            meta_db,
            counter_key: Self::counter_key(name),
        }
    }

    /// Meta-database key of the id counter for the named table.
    pub(crate) fn counter_key(name: &str) -> String {
        format!("{name}/next_tx_id")
    }

    /// Read the next id to assign. Missing counter means a fresh table.
    fn next_id(&self, txn: &RoTxn) -> Result<TxId, StoreError> {
        let val = self
            .meta_db
            .get(txn, self.counter_key.as_bytes())
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) if bytes.len() == 8 => {
                let arr: [u8; 8] = bytes.try_into().expect("checked length");
                Ok(TxId::new(u64::from_be_bytes(arr)))
            }
            Some(_) => Err(LmdbError::Corruption(
                "id counter has unexpected byte length".to_string(),
            ))?,
            None => Ok(TxId::FIRST),
        }
    }

    fn decode(val: &[u8]) -> Result<StagedTx, StoreError> {
        let tx: StagedTx = bincode::deserialize(val).map_err(LmdbError::from)?;
        Ok(tx)
    }
}

impl TxStagingStore for LmdbTxStagingStore {
    fn add(&self, txs: &[StagedTx]) -> Result<Vec<TxId>, StoreError> {
        for tx in txs {
            tx.validate()?;
            if tx.tx_id.is_some() {
                return Err(StoreError::Constraint(
                    "record already has a tx id".to_string(),
                ));
            }
        }

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut next = self.next_id(&wtxn)?;
        let mut ids = Vec::with_capacity(txs.len());
        for tx in txs {
            let mut record = tx.clone();
            record.tx_id = Some(next);
            let bytes = bincode::serialize(&record).map_err(LmdbError::from)?;
            self.db
                .put(&mut wtxn, &next.as_u64(), &bytes)
                .map_err(LmdbError::from)?;
            ids.push(next);
            next = next.next();
        }
        self.meta_db
            .put(
                &mut wtxn,
                self.counter_key.as_bytes(),
                &next.as_u64().to_be_bytes(),
            )
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(staged = ids.len(), "staged transactions");
        Ok(ids)
    }

    fn remove(&self, txs: &[StagedTx]) -> Result<(), StoreError> {
        // One write transaction per record: a mid-sequence failure leaves
        // earlier deletions committed. See the trait docs.
        for tx in txs {
            let id = tx.require_id()?;
            let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
            let existed = self
                .db
                .delete(&mut wtxn, &id.as_u64())
                .map_err(LmdbError::from)?;
            wtxn.commit().map_err(LmdbError::from)?;
            tracing::debug!(tx_id = %id, existed, "removed staged transaction");
        }
        Ok(())
    }

    fn count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }

    fn first(&self) -> Result<Option<StagedTx>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self.db.first(&rtxn).map_err(LmdbError::from)? {
            Some((_id, val)) => Ok(Some(Self::decode(val)?)),
            None => Ok(None),
        }
    }

    fn select_by_sender(
        &self,
        sender: &SenderKey,
        limit: usize,
    ) -> Result<Vec<StagedTx>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut results = Vec::new();
        let iter = self.db.iter(&rtxn).map_err(LmdbError::from)?;
        for result in iter {
            let (_id, val) = result.map_err(LmdbError::from)?;
            let tx = Self::decode(val)?;
            if tx.sender == *sender {
                results.push(tx);
            }
        }
        // Stable sort: equal nonces stay in id order.
        results.sort_by_key(|tx| tx.nonce);
        results.truncate(limit);
        Ok(results)
    }

    fn all(&self) -> Result<Vec<StagedTx>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut results = Vec::new();
        let iter = self.db.iter(&rtxn).map_err(LmdbError::from)?;
        for result in iter {
            let (_id, val) = result.map_err(LmdbError::from)?;
            results.push(Self::decode(val)?);
        }
        Ok(results)
    }

    fn next_nonce_of(&self, sender: &SenderKey) -> Result<Option<u64>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut max_nonce = None;
        let iter = self.db.iter(&rtxn).map_err(LmdbError::from)?;
        for result in iter {
            let (_id, val) = result.map_err(LmdbError::from)?;
            let tx = Self::decode(val)?;
            if tx.sender == *sender && max_nonce.map_or(true, |m| tx.nonce > m) {
                max_nonce = Some(tx.nonce);
            }
        }
        Ok(max_nonce.map(|n| n.saturating_add(1)))
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.db.clear(&mut wtxn).map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!("cleared staging table");
        Ok(())
    }

    fn clear_before_id(&self, threshold: TxId) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let deleted = self
            .db
            .delete_range(&mut wtxn, &(..threshold.as_u64()))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(deleted, threshold = %threshold, "pruned staged transactions");
        Ok(())
    }
}
