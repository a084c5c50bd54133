pub mod app;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{CodeDelivery, HospitalService, ServiceError, ServiceSettings, TracingCodeDelivery};
pub use domain::{EventHub, Ledger, LedgerError, TxReceipt};
pub use infra::config::AppConfig;
pub use infra::ethereum::EthLedger;
pub use storage::{ContentStore, IpfsStore, MemoryStore};
