//! In-process content store. CIDs are real CIDv1 values (json codec,
//! sha2-256), so they parse and compare like the ones an IPFS node returns.

use crate::storage::{parse_cid, ContentStore, StorageError};
use async_trait::async_trait;
use cid::multihash::Multihash;
use cid::Cid;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

const JSON_CODEC: u64 = 0x0200;
const SHA2_256: u64 = 0x12;

#[derive(Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<Cid, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

fn cid_for(bytes: &[u8]) -> Result<Cid, StorageError> {
    let digest = Sha256::digest(bytes);
    let hash = Multihash::<64>::wrap(SHA2_256, &digest)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(Cid::new_v1(JSON_CODEC, hash))
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn store(&self, blob: &Value) -> Result<Cid, StorageError> {
        let bytes = serde_json::to_vec(blob).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let cid = cid_for(&bytes)?;
        self.blobs.write().await.insert(cid, bytes);
        Ok(cid)
    }

    async fn fetch(&self, cid: &str) -> Result<Value, StorageError> {
        let parsed = parse_cid(cid)?;
        let blobs = self.blobs.read().await;
        let bytes = blobs
            .get(&parsed)
            .ok_or_else(|| StorageError::NotFound(parsed.to_string()))?;
        serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn ping(&self) -> Result<String, StorageError> {
        Ok("memory".to_string())
    }
}
