//! The Hospital contract surface as seen by the orchestrators.
//!
//! Implementations submit a write, wait for its inclusion and only return a
//! [`TxReceipt`] once the receipt reports success. The richer outcome of a
//! write (assigned DID, login status, ...) arrives as an event through
//! [`Ledger::events`].

use crate::domain::events::EventHub;
use async_trait::async_trait;
use primitive_types::H256;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger call {operation} failed: {reason}")]
    Call {
        operation: &'static str,
        reason: String,
    },

    #[error("{operation} transaction {tx_hash:?} was dropped before inclusion")]
    Dropped {
        operation: &'static str,
        tx_hash: H256,
    },

    #[error("{operation} transaction {tx_hash:?} failed during execution")]
    Reverted {
        operation: &'static str,
        tx_hash: H256,
    },

    #[error("{event} event not received within {waited:?} for transaction {tx_hash:?}")]
    EventTimeout {
        event: &'static str,
        tx_hash: H256,
        waited: Duration,
    },

    #[error("ledger event stream closed while waiting for {event}")]
    EventStreamClosed { event: &'static str },
}

#[async_trait]
pub trait Ledger: Send + Sync {
    async fn is_user_registered(&self, uid: &str) -> Result<bool, LedgerError>;

    async fn register_doctor(
        &self,
        uid: &str,
        cid: &str,
        specialization: &str,
    ) -> Result<TxReceipt, LedgerError>;

    async fn register_patient(
        &self,
        uid: &str,
        cid: &str,
        issue: &str,
        is_serious: bool,
    ) -> Result<TxReceipt, LedgerError>;

    async fn create_session(
        &self,
        did: &str,
        uid: &str,
        key_hash: [u8; 32],
        duration_secs: u64,
    ) -> Result<TxReceipt, LedgerError>;

    async fn validate_login(
        &self,
        did: &str,
        uid: &str,
        key_hash: [u8; 32],
    ) -> Result<TxReceipt, LedgerError>;

    async fn set_doctor_public_key(&self, did: &str, public_key: &str) -> Result<TxReceipt, LedgerError>;

    /// Latest block number; used as a liveness probe.
    async fn block_number(&self) -> Result<u64, LedgerError>;

    /// Hub carrying every decoded contract event tagged with its transaction.
    fn events(&self) -> &EventHub;
}
