//! Staging-store trait.

use crate::{StagedTx, StoreError};
use txq_types::{SenderKey, TxId};

/// Durable queue of staged transactions between producers (the submission
/// path) and a single logical consumer (the aggregator).
///
/// The store holds no in-process state between calls; every read reflects
/// the backend at call time. There is no locking across calls either, so
/// the `next_nonce_of` → `add` read-then-write pattern can race between
/// concurrent producers for the same sender. Callers needing strict
/// per-sender ordering must serialize submissions per sender upstream, or
/// detect duplicate-nonce records at the consumer. Duplicate
/// `(sender, nonce)` pairs are deliberately not rejected here.
pub trait TxStagingStore {
    /// Stage one or more records, assigning each a fresh increasing
    /// [`TxId`]. The batch is all-or-nothing: on error nothing is staged.
    ///
    /// Input records must not carry a `tx_id`; a pre-set id is a
    /// [`StoreError::Constraint`], as is any schema-bound violation.
    fn add(&self, txs: &[StagedTx]) -> Result<Vec<TxId>, StoreError>;

    /// Delete records by their assigned id. Records no longer present are
    /// silent no-ops; a record without a `tx_id` is a `Constraint` error.
    ///
    /// Each deletion is issued independently, so a mid-sequence failure
    /// leaves earlier deletions applied and later ones not attempted.
    /// Callers must re-query after a failed bulk remove rather than assume
    /// either outcome. Prefer [`clear_before_id`](Self::clear_before_id)
    /// for batch pruning, which is a single atomic range delete.
    fn remove(&self, txs: &[StagedTx]) -> Result<(), StoreError>;

    /// Total number of currently staged records.
    fn count(&self) -> Result<u64, StoreError>;

    /// The staged record with the smallest id, or `None` if empty.
    fn first(&self) -> Result<Option<StagedTx>, StoreError>;

    /// Staged records for `sender`, ascending by nonce, at most `limit`.
    fn select_by_sender(
        &self,
        sender: &SenderKey,
        limit: usize,
    ) -> Result<Vec<StagedTx>, StoreError>;

    /// Every staged record. The LMDB backend yields ascending id order;
    /// other backends make no ordering promise.
    fn all(&self) -> Result<Vec<StagedTx>, StoreError>;

    /// `Some(1 + max(nonce))` over the sender's staged records, or `None`
    /// if the sender has nothing staged — callers then fall back to the
    /// ledger's account nonce. Saturates at `u64::MAX` rather than wrap;
    /// a sender already staged at the ceiling keeps reporting the ceiling.
    fn next_nonce_of(&self, sender: &SenderKey) -> Result<Option<u64>, StoreError>;

    /// Delete every staged record. The id counter is not reset, matching
    /// a relational DELETE against a serial column. Test/reset use only.
    fn clear(&self) -> Result<(), StoreError>;

    /// Delete every record with id strictly less than `threshold`, as one
    /// atomic range delete. Idempotent: re-running with the same threshold
    /// is a no-op. Used to prune a confirmed bundle's records in one call.
    fn clear_before_id(&self, threshold: TxId) -> Result<(), StoreError>;
}
