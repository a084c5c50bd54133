//! The Hospital Service.
//!
//! This module sits between the HTTP handlers and the two external systems.
//! For every use case it:
//! 1.  Derives the person's UID and asks the ledger whether it is taken.
//! 2.  Issues a registration code and stores the layered data hash in the
//!     content store.
//! 3.  Submits the ledger write and waits for its confirmation.
//! 4.  Waits (bounded) for the event emitted by *that* transaction and
//!     shapes the outcome from it.
//!
//! Every step is terminal on failure. Nothing is rolled back: a stored blob
//! or a confirmed write stays where it is.

use crate::app::delivery::{CodeDelivery, Recipient, Role};
use crate::app::error::ServiceError;
use crate::crypto::{
    derive_data_hash, derive_user_uid, generate_registration_code, generate_session_key, CryptoError,
    KeyPair, REGISTRATION_CODE_LEN,
};
use crate::domain::{
    DoctorLogin, DoctorLoginStatus, DoctorRegistered, DoctorRegistration, Ledger, PatientRegistered,
    PatientRegistration, SessionCreated, TxReceipt,
};
use crate::infra::config::AppConfig;
use crate::storage::ContentStore;
use primitive_types::H256;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct ServiceSettings {
    pub uid_secret: String,
    pub event_timeout: Duration,
    pub session_duration_secs: u64,
}

impl ServiceSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            uid_secret: config.uid_secret.clone(),
            event_timeout: config.event_timeout,
            session_duration_secs: config.session_duration_secs,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DoctorRegistrationOutcome {
    pub tx_hash: H256,
    pub doctor_did: String,
    pub specialization: String,
    pub user_uid: String,
    pub first_login: bool,
}

#[derive(Debug, Clone)]
pub enum PatientRegistrationOutcome {
    Registered {
        tx_hash: H256,
        patient_did: String,
        assigned_doctor_did: String,
        first_login: bool,
    },
    /// The ledger accepted the write but reported failure (e.g. no doctor
    /// available for the issue).
    Rejected { tx_hash: H256 },
}

#[derive(Debug, Clone)]
pub struct DoctorLoginOutcome {
    pub message: String,
    pub doctor_did: String,
    pub user_uid: String,
    pub is_first_login: bool,
    /// PEM private key, present only on first login. Not kept anywhere else.
    pub private_key: Option<String>,
}

pub struct HospitalService {
    ledger: Arc<dyn Ledger>,
    store: Arc<dyn ContentStore>,
    delivery: Arc<dyn CodeDelivery>,
    settings: ServiceSettings,
}

impl HospitalService {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        store: Arc<dyn ContentStore>,
        delivery: Arc<dyn CodeDelivery>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            ledger,
            store,
            delivery,
            settings,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    async fn ensure_not_registered(&self, user_uid: &str, role: Role) -> Result<(), ServiceError> {
        if self.ledger.is_user_registered(user_uid).await? {
            info!(role = role.as_str(), user_uid, "user already registered");
            return Err(ServiceError::AlreadyRegistered {
                role: match role {
                    Role::Doctor => "Doctor",
                    Role::Patient => "Patient",
                },
            });
        }
        Ok(())
    }

    /// Issues a code and stores the final data hash. Returns (code, CID).
    async fn seal_profile(&self, profile: &Value, random_words: &str) -> Result<(String, String), ServiceError> {
        let code = generate_registration_code(REGISTRATION_CODE_LEN);
        let data_hash = derive_data_hash(profile, random_words, &code);
        let cid = self.store.store(&Value::String(data_hash)).await?;
        Ok((code, cid.to_string()))
    }

    async fn deliver_code(&self, recipient: Recipient, code: &str) -> Result<(), ServiceError> {
        self.delivery.deliver(&recipient, code).await.map_err(|e| {
            error!(did = %recipient.did, error = %e, "registration confirmed but code delivery failed");
            ServiceError::Internal(format!(
                "Registration of {} confirmed but the registration code could not be delivered.",
                recipient.did
            ))
        })
    }

    pub async fn register_doctor(&self, input: DoctorRegistration) -> Result<DoctorRegistrationOutcome, ServiceError> {
        let user_uid = derive_user_uid(&input.govt_id, &self.settings.uid_secret);
        self.ensure_not_registered(&user_uid, Role::Doctor).await?;

        let (code, cid) = self.seal_profile(&input.profile(), &input.random_words).await?;

        let subscription = self.ledger.events().subscribe();
        let receipt = self
            .ledger
            .register_doctor(&user_uid, &cid, &input.specialization)
            .await?;
        let event: DoctorRegistered = subscription
            .wait_for(receipt.tx_hash, self.settings.event_timeout)
            .await?;
        info!(did = %event.did, cid = %event.cid, specialization = %event.specialization, "doctor registered");

        self.deliver_code(
            Recipient {
                role: Role::Doctor,
                email: input.email.clone(),
                did: event.did.clone(),
            },
            &code,
        )
        .await?;

        Ok(DoctorRegistrationOutcome {
            tx_hash: receipt.tx_hash,
            doctor_did: event.did,
            specialization: input.specialization,
            user_uid,
            first_login: event.first_login,
        })
    }

    pub async fn register_patient(&self, input: PatientRegistration) -> Result<PatientRegistrationOutcome, ServiceError> {
        let user_uid = derive_user_uid(&input.govt_id, &self.settings.uid_secret);
        self.ensure_not_registered(&user_uid, Role::Patient).await?;

        let (code, cid) = self.seal_profile(&input.profile(), &input.random_words).await?;

        let subscription = self.ledger.events().subscribe();
        let receipt = self
            .ledger
            .register_patient(&user_uid, &cid, &input.issue, input.is_serious)
            .await?;
        let event: PatientRegistered = subscription
            .wait_for(receipt.tx_hash, self.settings.event_timeout)
            .await?;

        if !event.success {
            warn!(tx_hash = ?receipt.tx_hash, issue = %input.issue, "ledger rejected patient registration");
            return Ok(PatientRegistrationOutcome::Rejected {
                tx_hash: receipt.tx_hash,
            });
        }
        info!(did = %event.did, doctor = %event.assigned_doctor_did, "patient registered");

        self.deliver_code(
            Recipient {
                role: Role::Patient,
                email: input.email.clone(),
                did: event.did.clone(),
            },
            &code,
        )
        .await?;

        Ok(PatientRegistrationOutcome::Registered {
            tx_hash: receipt.tx_hash,
            patient_did: event.did,
            assigned_doctor_did: event.assigned_doctor_did,
            first_login: event.first_login,
        })
    }

    /// createSession -> SessionCreated -> validateLogin -> DoctorLoginStatus,
    /// then on first login a key pair whose public half goes to the ledger.
    pub async fn login_doctor(&self, input: DoctorLogin) -> Result<DoctorLoginOutcome, ServiceError> {
        let user_uid = derive_data_hash(&input.profile(), &input.random_words, &input.registration_code);
        let session = generate_session_key();

        let subscription = self.ledger.events().subscribe();
        let session_receipt = self
            .ledger
            .create_session(&input.did, &user_uid, session.key_hash, self.settings.session_duration_secs)
            .await?;
        let created: SessionCreated = subscription
            .wait_for(session_receipt.tx_hash, self.settings.event_timeout)
            .await?;
        if !created.success {
            warn!(did = %input.did, tx_hash = ?session_receipt.tx_hash, "ledger refused to create a session");
            return Err(ServiceError::LoginRejected("Session could not be created.".to_string()));
        }

        // From here on a failure leaves the session created but unused.
        let subscription = self.ledger.events().subscribe();
        let login_receipt = self
            .ledger
            .validate_login(&input.did, &user_uid, session.key_hash)
            .await
            .map_err(|e| abandoned("validateLogin", &session_receipt, e.into()))?;
        let status: DoctorLoginStatus = subscription
            .wait_for(login_receipt.tx_hash, self.settings.event_timeout)
            .await
            .map_err(|e| abandoned("DoctorLoginStatus", &session_receipt, e.into()))?;

        if !status.success {
            warn!(did = %input.did, message = %status.message, "login rejected by ledger");
            let message = if status.message.is_empty() {
                "Login failed.".to_string()
            } else {
                status.message
            };
            return Err(ServiceError::LoginRejected(message));
        }

        let private_key = if status.is_first_login {
            let keys = generate_key_pair(KeyPair::generate, &session_receipt).await?;
            self.ledger
                .set_doctor_public_key(&status.did, &keys.public_key)
                .await
                .map_err(|e| abandoned("setDoctorPublicKey", &session_receipt, e.into()))?;
            info!(did = %status.did, "doctor public key published");
            Some(keys.private_key)
        } else {
            None
        };

        info!(did = %status.did, first_login = status.is_first_login, "doctor logged in");
        Ok(DoctorLoginOutcome {
            message: status.message,
            doctor_did: status.did,
            user_uid,
            is_first_login: status.is_first_login,
            private_key,
        })
    }
}

/// Runs `generate` on the blocking pool. A panic in it is reported like any
/// other failure after session creation.
async fn generate_key_pair<F>(generate: F, session: &TxReceipt) -> Result<KeyPair, ServiceError>
where
    F: FnOnce() -> Result<KeyPair, CryptoError> + Send + 'static,
{
    tokio::task::spawn_blocking(generate)
        .await
        .map_err(|e| abandoned("generateKeyPair", session, ServiceError::Internal(e.to_string())))?
        .map_err(|e| abandoned("generateKeyPair", session, e.into()))
}

fn abandoned(stage: &'static str, session: &TxReceipt, err: ServiceError) -> ServiceError {
    warn!(
        stage,
        session_tx = ?session.tx_hash,
        error = %err,
        "login aborted after session creation; session left unused"
    );
    err
}
