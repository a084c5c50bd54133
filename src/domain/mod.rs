//! Ledger-facing domain types: the contract surface, its events, and the
//! validated use-case inputs.

pub mod events;
pub mod ledger;
pub mod model;

pub use events::{
    DoctorLoginStatus, DoctorRegistered, EventHub, EventPayload, EventSubscription, LedgerEvent,
    LedgerEventKind, PatientRegistered, SessionCreated,
};
pub use ledger::{Ledger, LedgerError, TxReceipt};
pub use model::{DoctorLogin, DoctorRegistration, PatientRegistration};
