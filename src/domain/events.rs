//! Contract events and the bounded, correlated wait on them.
//!
//! The ledger adapter publishes every decoded event into an [`EventHub`]
//! together with the hash of the transaction that emitted it. A caller
//! subscribes *before* submitting its write, then waits for the first event
//! of the expected type that carries its own transaction hash. The wait is
//! raced against a timeout, and the subscription is dropped on either
//! outcome, so no listener outlives the request.

use crate::domain::ledger::LedgerError;
use primitive_types::{H256, U256};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

pub const DEFAULT_HUB_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorRegistered {
    pub did: String,
    pub cid: String,
    pub specialization: String,
    pub first_login: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientRegistered {
    pub did: String,
    pub cid: String,
    pub first_login: bool,
    pub assigned_doctor_did: String,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCreated {
    pub user_did: String,
    pub expiry: U256,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorLoginStatus {
    pub did: String,
    pub cid: String,
    pub is_first_login: bool,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEventKind {
    DoctorRegistered(DoctorRegistered),
    PatientRegistered(PatientRegistered),
    SessionCreated(SessionCreated),
    DoctorLoginStatus(DoctorLoginStatus),
}

impl LedgerEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEventKind::DoctorRegistered(_) => DoctorRegistered::NAME,
            LedgerEventKind::PatientRegistered(_) => PatientRegistered::NAME,
            LedgerEventKind::SessionCreated(_) => SessionCreated::NAME,
            LedgerEventKind::DoctorLoginStatus(_) => DoctorLoginStatus::NAME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEvent {
    pub tx_hash: H256,
    pub kind: LedgerEventKind,
}

/// An event payload that can be picked out of the hub by type.
pub trait EventPayload: Sized {
    const NAME: &'static str;

    fn extract(kind: &LedgerEventKind) -> Option<Self>;
}

macro_rules! event_payload {
    ($ty:ident) => {
        impl EventPayload for $ty {
            const NAME: &'static str = stringify!($ty);

            fn extract(kind: &LedgerEventKind) -> Option<Self> {
                match kind {
                    LedgerEventKind::$ty(payload) => Some(payload.clone()),
                    _ => None,
                }
            }
        }
    };
}

event_payload!(DoctorRegistered);
event_payload!(PatientRegistered);
event_payload!(SessionCreated);
event_payload!(DoctorLoginStatus);

/// Process-wide fan-out of ledger events. Cloning shares the channel.
#[derive(Clone)]
pub struct EventHub {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns the number of live subscriptions the event reached.
    pub fn publish(&self, event: LedgerEvent) -> usize {
        // No subscribers is normal: nobody is waiting on this transaction.
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_CAPACITY)
    }
}

/// A live subscription. Consumed by [`EventSubscription::wait_for`].
pub struct EventSubscription {
    receiver: broadcast::Receiver<LedgerEvent>,
}

impl EventSubscription {
    /// Waits for the first `E` emitted by transaction `tx_hash`.
    ///
    /// Events of other types, or from other transactions, are skipped.
    pub async fn wait_for<E: EventPayload>(self, tx_hash: H256, timeout: Duration) -> Result<E, LedgerError> {
        let mut receiver = self.receiver;
        let wait = async {
            loop {
                match receiver.recv().await {
                    Ok(event) if event.tx_hash == tx_hash => {
                        if let Some(payload) = E::extract(&event.kind) {
                            return Ok(payload);
                        }
                    }
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(event = E::NAME, skipped, "event subscription lagged");
                    }
                    Err(RecvError::Closed) => {
                        return Err(LedgerError::EventStreamClosed { event: E::NAME });
                    }
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::EventTimeout {
                event: E::NAME,
                tx_hash,
                waited: timeout,
            }),
        }
    }
}
