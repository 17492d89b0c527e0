//! Null store — thread-safe in-memory staging store for testing.

use std::collections::BTreeMap;
use std::sync::Mutex;

use txq_store::{StagedTx, StoreError, TxStagingStore};
use txq_types::{SenderKey, TxId};

struct Inner {
    txs: BTreeMap<u64, StagedTx>,
    next_id: TxId,
}

/// An in-memory staging store for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
///
/// The map and the id counter live behind one lock, so `add` batches are
/// atomic just like the LMDB backend's write transactions.
pub struct NullTxStore {
    inner: Mutex<Inner>,
}

impl NullTxStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                txs: BTreeMap::new(),
                next_id: TxId::FIRST,
            }),
        }
    }
}

impl Default for NullTxStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TxStagingStore for NullTxStore {
    fn add(&self, txs: &[StagedTx]) -> Result<Vec<TxId>, StoreError> {
        for tx in txs {
            tx.validate()?;
            if tx.tx_id.is_some() {
                return Err(StoreError::Constraint(
                    "record already has a tx id".to_string(),
                ));
            }
        }
        let mut inner = self.inner.lock().unwrap();
        let mut ids = Vec::with_capacity(txs.len());
        for tx in txs {
            let id = inner.next_id;
            let mut record = tx.clone();
            record.tx_id = Some(id);
            inner.txs.insert(id.as_u64(), record);
            inner.next_id = id.next();
            ids.push(id);
        }
        Ok(ids)
    }

    fn remove(&self, txs: &[StagedTx]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        for tx in txs {
            let id = tx.require_id()?;
            inner.txs.remove(&id.as_u64());
        }
        Ok(())
    }

    fn count(&self) -> Result<u64, StoreError> {
        Ok(self.inner.lock().unwrap().txs.len() as u64)
    }

    fn first(&self) -> Result<Option<StagedTx>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .txs
            .values()
            .next()
            .cloned())
    }

    fn select_by_sender(
        &self,
        sender: &SenderKey,
        limit: usize,
    ) -> Result<Vec<StagedTx>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut results: Vec<StagedTx> = inner
            .txs
            .values()
            .filter(|tx| tx.sender == *sender)
            .cloned()
            .collect();
        results.sort_by_key(|tx| tx.nonce);
        results.truncate(limit);
        Ok(results)
    }

    fn all(&self) -> Result<Vec<StagedTx>, StoreError> {
        Ok(self.inner.lock().unwrap().txs.values().cloned().collect())
    }

    fn next_nonce_of(&self, sender: &SenderKey) -> Result<Option<u64>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .txs
            .values()
            .filter(|tx| tx.sender == *sender)
            .map(|tx| tx.nonce)
            .max()
            .map(|n| n.saturating_add(1)))
    }

    fn clear(&self) -> Result<(), StoreError> {
        // Counter deliberately survives, like a serial column after DELETE.
        self.inner.lock().unwrap().txs.clear();
        Ok(())
    }

    fn clear_before_id(&self, threshold: TxId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.txs = inner.txs.split_off(&threshold.as_u64());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx(sender: &str, nonce: u64) -> StagedTx {
        StagedTx {
            tx_id: None,
            sender: SenderKey::new(sender),
            nonce,
            signature: "signature".to_string(),
            contract_address: "0x0000000000000000000000000000000000000000".to_string(),
            method_id: "0xabcdef12".to_string(),
            encoded_params: "encoded-params".to_string(),
        }
    }

    #[test]
    fn add_assigns_increasing_ids() {
        let store = NullTxStore::new();
        let ids = store
            .add(&[sample_tx("a", 0), sample_tx("b", 0)])
            .unwrap();
        assert_eq!(ids, vec![TxId::new(1), TxId::new(2)]);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn first_is_the_oldest_record() {
        let store = NullTxStore::new();
        let ids = store
            .add(&[sample_tx("a", 9), sample_tx("b", 1)])
            .unwrap();
        assert_eq!(store.first().unwrap().unwrap().tx_id, Some(ids[0]));
    }

    #[test]
    fn next_nonce_and_select_match_the_lmdb_contract() {
        let store = NullTxStore::new();
        store
            .add(&[sample_tx("X", 5), sample_tx("X", 6), sample_tx("Y", 2)])
            .unwrap();

        assert_eq!(store.next_nonce_of(&SenderKey::new("X")).unwrap(), Some(7));
        assert_eq!(store.next_nonce_of(&SenderKey::new("Z")).unwrap(), None);

        let rows = store.select_by_sender(&SenderKey::new("X"), 10).unwrap();
        let nonces: Vec<u64> = rows.iter().map(|tx| tx.nonce).collect();
        assert_eq!(nonces, vec![5, 6]);
    }

    #[test]
    fn next_nonce_saturates_at_the_ceiling() {
        let store = NullTxStore::new();
        store.add(&[sample_tx("x", u64::MAX)]).unwrap();
        assert_eq!(
            store.next_nonce_of(&SenderKey::new("x")).unwrap(),
            Some(u64::MAX)
        );
    }

    #[test]
    fn clear_before_id_prunes_strictly_older() {
        let store = NullTxStore::new();
        let ids = store
            .add(&[sample_tx("X", 5), sample_tx("X", 6)])
            .unwrap();
        store.clear_before_id(ids[1]).unwrap();

        let remaining = store.all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].tx_id, Some(ids[1]));

        store.clear_before_id(ids[1]).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn clear_keeps_the_id_counter() {
        let store = NullTxStore::new();
        store.add(&[sample_tx("a", 0)]).unwrap();
        store.clear().unwrap();
        let ids = store.add(&[sample_tx("a", 1)]).unwrap();
        assert_eq!(ids, vec![TxId::new(2)]);
    }

    #[test]
    fn remove_by_id_and_missing_id_error() {
        let store = NullTxStore::new();
        store.add(&[sample_tx("a", 0)]).unwrap();
        let staged = store.all().unwrap();
        store.remove(&staged).unwrap();
        assert_eq!(store.count().unwrap(), 0);

        let err = store.remove(&[sample_tx("a", 0)]).unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }
}
