//! Centralized configuration (environment variables + defaults).
//!
//! `.env` is loaded by the binaries through `dotenv`; everything here reads
//! through a lookup function so parsing can be tested without touching the
//! process environment.

use crate::infra::logging::LogFormat;
use anyhow::{anyhow, Context};
use ethers::types::Address;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_IPFS_API_URL: &str = "http://127.0.0.1:5001";
pub const DEFAULT_EVENT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_IPFS_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_SESSION_DURATION_SECS: u64 = 10 * 60;

#[derive(Debug, Clone, Copy)]
pub struct ContractAddresses {
    pub hospital: Address,
    /// Only checked by preflight; the service talks to the Hospital contract.
    pub patient: Option<Address>,
    pub doctor: Option<Address>,
}

pub struct AppConfig {
    pub port: u16,
    pub rpc_url: String,
    /// Hex private key of the account that signs every ledger write.
    pub signer_key: String,
    pub contracts: ContractAddresses,
    pub ipfs_api_url: String,
    pub ipfs_timeout: Duration,
    /// Bound on each wait for a contract event after a confirmed write.
    pub event_timeout: Duration,
    /// How often the provider polls for receipts and new logs.
    pub poll_interval: Duration,
    pub confirmations: usize,
    pub session_duration_secs: u64,
    /// Institutional secret used to key government IDs into UIDs.
    pub uid_secret: String,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("rpc_url", &self.rpc_url)
            .field("signer_key", &"<redacted>")
            .field("contracts", &self.contracts)
            .field("ipfs_api_url", &self.ipfs_api_url)
            .field("ipfs_timeout", &self.ipfs_timeout)
            .field("event_timeout", &self.event_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("confirmations", &self.confirmations)
            .field("session_duration_secs", &self.session_duration_secs)
            .field("uid_secret", &"<redacted>")
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let signer_key = match (get("SIGNER_PRIVATE_KEY"), get("SIGNER_KEY_FILE")) {
            (Some(key), _) => key,
            (None, Some(path)) => {
                let path = shellexpand::tilde(&path).to_string();
                std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read SIGNER_KEY_FILE {}", path))?
                    .trim()
                    .to_string()
            }
            (None, None) => return Err(anyhow!("SIGNER_PRIVATE_KEY or SIGNER_KEY_FILE must be set")),
        };

        let hospital = get("HOSPITAL_CONTRACT_ADDRESS")
            .ok_or_else(|| anyhow!("HOSPITAL_CONTRACT_ADDRESS must be set"))
            .and_then(|v| parse_address("HOSPITAL_CONTRACT_ADDRESS", &v))?;
        let patient = get("PATIENT_CONTRACT_ADDRESS")
            .map(|v| parse_address("PATIENT_CONTRACT_ADDRESS", &v))
            .transpose()?;
        let doctor = get("DOCTOR_CONTRACT_ADDRESS")
            .map(|v| parse_address("DOCTOR_CONTRACT_ADDRESS", &v))
            .transpose()?;

        let uid_secret = get("UID_SECRET").ok_or_else(|| anyhow!("UID_SECRET must be set"))?;

        Ok(Self {
            port: parse_or(&get, "PORT", DEFAULT_PORT)?,
            rpc_url: get("ETH_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            signer_key,
            contracts: ContractAddresses {
                hospital,
                patient,
                doctor,
            },
            ipfs_api_url: get("IPFS_API_URL").unwrap_or_else(|| DEFAULT_IPFS_API_URL.to_string()),
            ipfs_timeout: Duration::from_secs(parse_or(&get, "IPFS_TIMEOUT_SECS", DEFAULT_IPFS_TIMEOUT_SECS)?),
            event_timeout: Duration::from_secs(
                parse_or(&get, "EVENT_TIMEOUT_SECS", DEFAULT_EVENT_TIMEOUT_SECS)?.max(1),
            ),
            poll_interval: Duration::from_millis(
                parse_or(&get, "POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?.max(10),
            ),
            confirmations: parse_or(&get, "TX_CONFIRMATIONS", 1usize)?.max(1),
            session_duration_secs: parse_or(&get, "SESSION_DURATION_SECS", DEFAULT_SESSION_DURATION_SECS)?,
            uid_secret,
            log_format: get("LOG_FORMAT")
                .map(|v| LogFormat::from_str_lossy(&v))
                .unwrap_or(LogFormat::Pretty),
        })
    }
}

fn parse_address(key: &str, value: &str) -> anyhow::Result<Address> {
    value
        .parse::<Address>()
        .map_err(|e| anyhow!("{} is not a valid address ({}): {}", key, value, e))
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => v
            .parse::<T>()
            .map_err(|e| anyhow!("{} must be a valid number ({}): {}", key, v, e)),
        None => Ok(default),
    }
}
