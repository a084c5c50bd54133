pub mod delivery;
pub mod error;
pub mod hospital_service;

pub use delivery::{CodeDelivery, Recipient, Role, TracingCodeDelivery};
pub use error::ServiceError;
pub use hospital_service::{
    DoctorLoginOutcome, DoctorRegistrationOutcome, HospitalService, PatientRegistrationOutcome,
    ServiceSettings,
};
