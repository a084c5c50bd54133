//! Shared harness: an in-process Hospital contract, a capturing code
//! delivery, and a helper that boots the router on an ephemeral port.

#![allow(dead_code)]

use async_trait::async_trait;
use hospital_ledger_gateway::app::{CodeDelivery, Recipient};
use hospital_ledger_gateway::domain::{
    DoctorLoginStatus, DoctorRegistered, EventHub, Ledger, LedgerError, LedgerEvent, LedgerEventKind,
    PatientRegistered, SessionCreated, TxReceipt,
};
use hospital_ledger_gateway::transport;
use hospital_ledger_gateway::{ContentStore, HospitalService, MemoryStore, ServiceSettings};
use primitive_types::{H256, U256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const UID_SECRET: &str = "test institution secret";

/// Knobs for misbehaving ledgers.
#[derive(Debug, Default, Clone, Copy)]
pub struct Behavior {
    /// Confirm writes but never emit events.
    pub silent: bool,
    /// Emit a same-typed event for an unrelated transaction first.
    pub decoy: bool,
    /// Fail every write at submission.
    pub fail_writes: bool,
}

#[derive(Debug, Clone)]
pub struct DoctorRecord {
    pub uid: String,
    pub cid: String,
    pub specialization: String,
    pub first_login: bool,
    pub public_key: Option<String>,
}

#[derive(Default)]
struct Registry {
    uids: HashSet<String>,
    doctors: HashMap<String, DoctorRecord>,
    patients: HashMap<String, String>,
    sessions: HashMap<String, [u8; 32]>,
    next_did: u64,
    register_calls: u64,
}

/// Mimics the Hospital contract: registration, doctor assignment by
/// specialization, sessions keyed by DID, and the first-login flag.
pub struct SimulatedHospital {
    hub: EventHub,
    store: Arc<MemoryStore>,
    registry: Mutex<Registry>,
    behavior: Mutex<Behavior>,
    tx_counter: AtomicU64,
}

impl SimulatedHospital {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            hub: EventHub::default(),
            store,
            registry: Mutex::new(Registry::default()),
            behavior: Mutex::new(Behavior::default()),
            tx_counter: AtomicU64::new(1),
        }
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn register_calls(&self) -> u64 {
        self.registry.lock().unwrap().register_calls
    }

    pub fn doctor(&self, did: &str) -> Option<DoctorRecord> {
        self.registry.lock().unwrap().doctors.get(did).cloned()
    }

    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    fn behavior(&self) -> Behavior {
        *self.behavior.lock().unwrap()
    }

    fn next_tx(&self) -> H256 {
        H256::from_low_u64_be(self.tx_counter.fetch_add(1, Ordering::SeqCst))
    }

    fn begin_write(&self, operation: &'static str) -> Result<TxReceipt, LedgerError> {
        if self.behavior().fail_writes {
            return Err(LedgerError::Call {
                operation,
                reason: "execution reverted: simulated failure".to_string(),
            });
        }
        Ok(TxReceipt {
            tx_hash: self.next_tx(),
            block_number: Some(self.tx_counter.load(Ordering::SeqCst)),
        })
    }

    /// Publishes shortly after the receipt is returned, like a log poller would.
    fn emit(&self, tx_hash: H256, kind: LedgerEventKind) {
        let behavior = self.behavior();
        if behavior.silent {
            return;
        }
        let hub = self.hub.clone();
        let decoy = behavior.decoy.then(|| LedgerEvent {
            tx_hash: self.next_tx(),
            kind: decoy_of(&kind),
        });
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if let Some(decoy) = decoy {
                hub.publish(decoy);
            }
            hub.publish(LedgerEvent { tx_hash, kind });
        });
    }
}

fn decoy_of(kind: &LedgerEventKind) -> LedgerEventKind {
    let mut kind = kind.clone();
    match &mut kind {
        LedgerEventKind::DoctorRegistered(e) => e.did = "did:decoy".to_string(),
        LedgerEventKind::PatientRegistered(e) => e.did = "did:decoy".to_string(),
        LedgerEventKind::SessionCreated(e) => e.user_did = "did:decoy".to_string(),
        LedgerEventKind::DoctorLoginStatus(e) => e.did = "did:decoy".to_string(),
    }
    kind
}

#[async_trait]
impl Ledger for SimulatedHospital {
    async fn is_user_registered(&self, uid: &str) -> Result<bool, LedgerError> {
        Ok(self.registry.lock().unwrap().uids.contains(uid))
    }

    async fn register_doctor(&self, uid: &str, cid: &str, specialization: &str) -> Result<TxReceipt, LedgerError> {
        let receipt = self.begin_write("registerDoctor")?;
        let did = {
            let mut reg = self.registry.lock().unwrap();
            reg.register_calls += 1;
            reg.next_did += 1;
            let did = format!("did:hospital:doctor:{}", reg.next_did);
            reg.uids.insert(uid.to_string());
            reg.doctors.insert(
                did.clone(),
                DoctorRecord {
                    uid: uid.to_string(),
                    cid: cid.to_string(),
                    specialization: specialization.to_string(),
                    first_login: true,
                    public_key: None,
                },
            );
            did
        };
        self.emit(
            receipt.tx_hash,
            LedgerEventKind::DoctorRegistered(DoctorRegistered {
                did,
                cid: cid.to_string(),
                specialization: specialization.to_string(),
                first_login: true,
            }),
        );
        Ok(receipt)
    }

    async fn register_patient(
        &self,
        uid: &str,
        cid: &str,
        issue: &str,
        _is_serious: bool,
    ) -> Result<TxReceipt, LedgerError> {
        let receipt = self.begin_write("registerPatient")?;
        let event = {
            let mut reg = self.registry.lock().unwrap();
            reg.register_calls += 1;
            let assigned = reg
                .doctors
                .iter()
                .filter(|(_, d)| d.specialization == issue)
                .map(|(did, _)| did.clone())
                .min();
            match assigned {
                Some(doctor_did) => {
                    reg.next_did += 1;
                    let did = format!("did:hospital:patient:{}", reg.next_did);
                    reg.uids.insert(uid.to_string());
                    reg.patients.insert(did.clone(), doctor_did.clone());
                    PatientRegistered {
                        did,
                        cid: cid.to_string(),
                        first_login: true,
                        assigned_doctor_did: doctor_did,
                        success: true,
                    }
                }
                None => PatientRegistered {
                    did: String::new(),
                    cid: cid.to_string(),
                    first_login: false,
                    assigned_doctor_did: String::new(),
                    success: false,
                },
            }
        };
        self.emit(receipt.tx_hash, LedgerEventKind::PatientRegistered(event));
        Ok(receipt)
    }

    async fn create_session(
        &self,
        did: &str,
        _uid: &str,
        key_hash: [u8; 32],
        duration_secs: u64,
    ) -> Result<TxReceipt, LedgerError> {
        let receipt = self.begin_write("createSession")?;
        let success = {
            let mut reg = self.registry.lock().unwrap();
            if reg.doctors.contains_key(did) {
                reg.sessions.insert(did.to_string(), key_hash);
                true
            } else {
                false
            }
        };
        self.emit(
            receipt.tx_hash,
            LedgerEventKind::SessionCreated(SessionCreated {
                user_did: did.to_string(),
                expiry: U256::from(1_700_000_000u64 + duration_secs),
                success,
            }),
        );
        Ok(receipt)
    }

    async fn validate_login(&self, did: &str, uid: &str, key_hash: [u8; 32]) -> Result<TxReceipt, LedgerError> {
        let receipt = self.begin_write("validateLogin")?;
        let (record, session) = {
            let reg = self.registry.lock().unwrap();
            (reg.doctors.get(did).cloned(), reg.sessions.get(did).copied())
        };

        let status = match record {
            Some(record) => {
                // The stored blob is the data hash a correct login reproduces.
                let stored = self.store.fetch(&record.cid).await.ok();
                let matches = stored.as_ref().and_then(|v| v.as_str()) == Some(uid);
                if matches && session == Some(key_hash) {
                    DoctorLoginStatus {
                        did: did.to_string(),
                        cid: record.cid,
                        is_first_login: record.first_login,
                        success: true,
                        message: "Login successful".to_string(),
                    }
                } else {
                    DoctorLoginStatus {
                        did: did.to_string(),
                        cid: String::new(),
                        is_first_login: false,
                        success: false,
                        message: "Invalid credentials".to_string(),
                    }
                }
            }
            None => DoctorLoginStatus {
                did: did.to_string(),
                cid: String::new(),
                is_first_login: false,
                success: false,
                message: String::new(),
            },
        };
        self.emit(receipt.tx_hash, LedgerEventKind::DoctorLoginStatus(status));
        Ok(receipt)
    }

    async fn set_doctor_public_key(&self, did: &str, public_key: &str) -> Result<TxReceipt, LedgerError> {
        let receipt = self.begin_write("setDoctorPublicKey")?;
        let mut reg = self.registry.lock().unwrap();
        if let Some(doctor) = reg.doctors.get_mut(did) {
            doctor.public_key = Some(public_key.to_string());
            doctor.first_login = false;
        }
        Ok(receipt)
    }

    async fn block_number(&self) -> Result<u64, LedgerError> {
        Ok(self.tx_counter.load(Ordering::SeqCst))
    }

    fn events(&self) -> &EventHub {
        &self.hub
    }
}

/// Keeps every issued code, keyed by DID.
#[derive(Default)]
pub struct CapturingDelivery {
    codes: Mutex<HashMap<String, String>>,
}

impl CapturingDelivery {
    pub fn code_for(&self, did: &str) -> Option<String> {
        self.codes.lock().unwrap().get(did).cloned()
    }

    pub fn count(&self) -> usize {
        self.codes.lock().unwrap().len()
    }
}

#[async_trait]
impl CodeDelivery for CapturingDelivery {
    async fn deliver(&self, recipient: &Recipient, registration_code: &str) -> anyhow::Result<()> {
        self.codes
            .lock()
            .unwrap()
            .insert(recipient.did.clone(), registration_code.to_string());
        Ok(())
    }
}

pub struct TestApp {
    pub base_url: String,
    pub http: reqwest::Client,
    pub ledger: Arc<SimulatedHospital>,
    pub store: Arc<MemoryStore>,
    pub delivery: Arc<CapturingDelivery>,
    server: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn post(&self, path: &str, body: &serde_json::Value) -> (u16, serde_json::Value) {
        let response = self.http.post(self.url(path)).json(body).send().await.unwrap();
        let status = response.status().as_u16();
        let body = response.json::<serde_json::Value>().await.unwrap();
        (status, body)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server.abort();
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_timeout(Duration::from_secs(2)).await
}

pub async fn spawn_app_with_timeout(event_timeout: Duration) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let ledger = Arc::new(SimulatedHospital::new(store.clone()));
    let delivery = Arc::new(CapturingDelivery::default());

    let service = HospitalService::new(
        ledger.clone(),
        store.clone(),
        delivery.clone(),
        ServiceSettings {
            uid_secret: UID_SECRET.to_string(),
            event_timeout,
            session_duration_secs: 600,
        },
    );
    let app_state = transport::http::AppState {
        service: Arc::new(service),
    };
    let router = transport::http::create_router(app_state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        base_url: format!("http://{}", addr),
        http: reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap(),
        ledger,
        store,
        delivery,
        server,
    }
}

pub fn doctor_body(govt_id: &str, specialization: &str) -> serde_json::Value {
    serde_json::json!({
        "email": format!("{}@hospital.example", govt_id.to_lowercase()),
        "specialization": specialization,
        "govtId": govt_id,
        "randomWords": "amber falcon quiet harbor"
    })
}

pub fn patient_body(govt_id: &str, issue: &str) -> serde_json::Value {
    serde_json::json!({
        "govtId": govt_id,
        "name": "Ada Lovelace",
        "email": "ada@example.org",
        "phoneNumber": "555-0100",
        "age": 36,
        "address": "12 St James's Square",
        "issue": issue,
        "isSerious": true,
        "randomWords": "copper lantern mild echo"
    })
}
