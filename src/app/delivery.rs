//! Out-of-band delivery of registration codes.
//!
//! The code is never stored and never returned over HTTP; whoever runs the
//! service decides how it reaches the person (mail, SMS, front desk).

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Doctor,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recipient {
    pub role: Role,
    pub email: String,
    pub did: String,
}

#[async_trait]
pub trait CodeDelivery: Send + Sync {
    async fn deliver(&self, recipient: &Recipient, registration_code: &str) -> anyhow::Result<()>;
}

/// Emits the code as a log record under the `registration_code` target, so
/// it can be routed to a dedicated sink (or filtered out) by `RUST_LOG`.
pub struct TracingCodeDelivery;

#[async_trait]
impl CodeDelivery for TracingCodeDelivery {
    async fn deliver(&self, recipient: &Recipient, registration_code: &str) -> anyhow::Result<()> {
        tracing::info!(
            target: "registration_code",
            role = recipient.role.as_str(),
            email = %recipient.email,
            did = %recipient.did,
            code = registration_code,
            "registration code issued"
        );
        Ok(())
    }
}
