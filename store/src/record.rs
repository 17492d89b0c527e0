//! The staged-transaction record and its schema bounds.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use txq_types::{SenderKey, TxId};

/// Maximum length of a staged signature.
pub const MAX_SIGNATURE_LEN: usize = 130;
/// Exact length of a target contract address.
pub const CONTRACT_ADDRESS_LEN: usize = 42;
/// Maximum length of a method selector.
pub const MAX_METHOD_ID_LEN: usize = 10;

/// One signed transaction staged for bundling.
///
/// Records are insert/delete only; nothing is mutated in place after
/// staging. `tx_id` is `None` until the store assigns one on `add`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedTx {
    /// Store-assigned identifier; `None` before insertion.
    pub tx_id: Option<TxId>,
    /// The signer's public key.
    pub sender: SenderKey,
    /// Sender-scoped sequence number this transaction consumes.
    pub nonce: u64,
    /// Signature over the call, opaque to the store.
    pub signature: String,
    /// Address of the contract the bundled call targets.
    pub contract_address: String,
    /// Selector of the method to invoke.
    pub method_id: String,
    /// ABI-encoded call parameters, unbounded.
    pub encoded_params: String,
}

impl StagedTx {
    /// Check this record against the schema column bounds.
    ///
    /// Called by every `add` implementation before anything is written;
    /// a violation surfaces as [`StoreError::Constraint`].
    pub fn validate(&self) -> Result<(), StoreError> {
        if !self.sender.is_valid() {
            return Err(StoreError::Constraint(format!(
                "sender key length {} out of bounds (1..={})",
                self.sender.as_str().len(),
                SenderKey::MAX_LEN
            )));
        }
        if self.signature.len() > MAX_SIGNATURE_LEN {
            return Err(StoreError::Constraint(format!(
                "signature length {} exceeds {}",
                self.signature.len(),
                MAX_SIGNATURE_LEN
            )));
        }
        if self.contract_address.len() != CONTRACT_ADDRESS_LEN {
            return Err(StoreError::Constraint(format!(
                "contract address length {} != {}",
                self.contract_address.len(),
                CONTRACT_ADDRESS_LEN
            )));
        }
        if self.method_id.len() > MAX_METHOD_ID_LEN {
            return Err(StoreError::Constraint(format!(
                "method id length {} exceeds {}",
                self.method_id.len(),
                MAX_METHOD_ID_LEN
            )));
        }
        Ok(())
    }

    /// The assigned identifier, or a `Constraint` error if the record has
    /// not been staged yet.
    pub fn require_id(&self) -> Result<TxId, StoreError> {
        self.tx_id
            .ok_or_else(|| StoreError::Constraint("record has no tx id".to_string()))
    }
}
