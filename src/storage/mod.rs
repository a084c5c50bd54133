//! Content-addressed blob storage.
//!
//! Content addressing has no in-place mutation and no erasure. Two writes
//! make that explicit in their names:
//!
//! - [`ContentStore::store_revision`] stores a new object for a changed blob.
//!   The previous CID keeps resolving to the previous content; the caller must
//!   hand the new CID to the ledger.
//! - [`ContentStore::mark_deleted`] writes a tombstone object that names the
//!   superseded CID. Nothing is removed: the old CID stays resolvable forever.

use async_trait::async_trait;
use chrono::Utc;
use cid::Cid;
use serde_json::{json, Value};

pub mod ipfs;
pub mod memory;

pub use ipfs::IpfsStore;
pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid CID '{cid}': {reason}")]
    InvalidCid { cid: String, reason: String },

    #[error("content not found for CID {0}")]
    NotFound(String),

    #[error("storage node unreachable: {0}")]
    Unavailable(String),

    #[error("storage node rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("stored content is not valid JSON: {0}")]
    Serialization(String),
}

/// Parses a CID string, mapping failures to [`StorageError::InvalidCid`].
pub fn parse_cid(cid: &str) -> Result<Cid, StorageError> {
    Cid::try_from(cid.trim()).map_err(|e| StorageError::InvalidCid {
        cid: cid.to_string(),
        reason: e.to_string(),
    })
}

/// The object written by [`ContentStore::mark_deleted`].
pub fn tombstone_for(cid: &Cid) -> Value {
    json!({
        "deleted": true,
        "supersedes": cid.to_string(),
        "deletedAt": Utc::now().to_rfc3339(),
    })
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Serializes `blob` as JSON, adds it to the store and returns its CID.
    async fn store(&self, blob: &Value) -> Result<Cid, StorageError>;

    /// Resolves a CID back to the JSON value it was stored from.
    async fn fetch(&self, cid: &str) -> Result<Value, StorageError>;

    /// Short description of the backing node (version string).
    async fn ping(&self) -> Result<String, StorageError>;

    /// Writes a tombstone for `cid` and returns the tombstone's CID.
    async fn mark_deleted(&self, cid: &str) -> Result<Cid, StorageError> {
        let old = parse_cid(cid)?;
        self.store(&tombstone_for(&old)).await
    }

    /// Stores `blob` as a new object. `cid` is only validated, never read.
    async fn store_revision(&self, cid: &str, blob: &Value) -> Result<Cid, StorageError> {
        parse_cid(cid)?;
        self.store(blob).await
    }
}
