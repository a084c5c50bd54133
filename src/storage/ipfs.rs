// Content store backed by an IPFS node's HTTP RPC API (Kubo).

use crate::storage::{parse_cid, ContentStore, StorageError};
use async_trait::async_trait;
use cid::Cid;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

#[derive(Deserialize)]
struct VersionResponse {
    #[serde(rename = "Version")]
    version: String,
}

/// Talks to `<base_url>/api/v0/*`. Cloning shares the connection pool.
#[derive(Clone)]
pub struct IpfsStore {
    http: reqwest::Client,
    base_url: String,
}

impl IpfsStore {
    pub fn new(base_url: &str, request_timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v0/{}", self.base_url, path)
    }

    async fn checked(resp: reqwest::Response) -> Result<reqwest::Response, StorageError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StorageError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

fn unavailable(e: reqwest::Error) -> StorageError {
    StorageError::Unavailable(e.to_string())
}

#[async_trait]
impl ContentStore for IpfsStore {
    async fn store(&self, blob: &Value) -> Result<Cid, StorageError> {
        let bytes = serde_json::to_vec(blob).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let part = Part::bytes(bytes)
            .file_name("blob.json")
            .mime_str("application/json")
            .map_err(unavailable)?;
        let form = Form::new().part("file", part);

        let resp = self
            .http
            .post(self.endpoint("add"))
            .query(&[("cid-version", "1"), ("pin", "true")])
            .multipart(form)
            .send()
            .await
            .map_err(unavailable)?;
        let added: AddResponse = Self::checked(resp).await?.json().await.map_err(unavailable)?;

        tracing::debug!(cid = %added.hash, "stored blob on IPFS");
        parse_cid(&added.hash)
    }

    async fn fetch(&self, cid: &str) -> Result<Value, StorageError> {
        let parsed = parse_cid(cid)?;
        let resp = self
            .http
            .post(self.endpoint("cat"))
            .query(&[("arg", parsed.to_string())])
            .send()
            .await
            .map_err(unavailable)?;
        let resp = match Self::checked(resp).await {
            Err(StorageError::Rejected { body, .. }) if body.contains("not found") => {
                return Err(StorageError::NotFound(parsed.to_string()))
            }
            other => other?,
        };
        let bytes = resp.bytes().await.map_err(unavailable)?;
        serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn ping(&self) -> Result<String, StorageError> {
        let resp = self
            .http
            .post(self.endpoint("version"))
            .send()
            .await
            .map_err(unavailable)?;
        let v: VersionResponse = Self::checked(resp).await?.json().await.map_err(unavailable)?;
        Ok(v.version)
    }
}
