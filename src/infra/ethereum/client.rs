// Responsible for all communication with the Ethereum ledger.

use crate::domain::events::{
    DoctorLoginStatus, DoctorRegistered, EventHub, LedgerEvent, LedgerEventKind, PatientRegistered,
    SessionCreated,
};
use crate::domain::ledger::{Ledger, LedgerError, TxReceipt};
use crate::infra::config::AppConfig;
use crate::infra::ethereum::abi::{HospitalContract, HospitalContractEvents};
use async_trait::async_trait;
use ethers::contract::{ContractCall, ContractError};
use ethers::middleware::{NonceManagerMiddleware, SignerMiddleware};
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{U256, U64};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Provider -> signer -> nonce manager. The nonce manager is outermost so it
/// assigns every nonce before the signer would fetch one from the node;
/// concurrent requests then submit writes from the one account without
/// colliding.
pub type SignerClient = NonceManagerMiddleware<SignerMiddleware<Provider<Http>, LocalWallet>>;

pub struct EthLedger {
    client: Arc<SignerClient>,
    hospital: HospitalContract<SignerClient>,
    hub: EventHub,
    confirmations: usize,
    poll_interval: Duration,
    shutdown: Arc<Notify>,
}

impl EthLedger {
    /// Connects to the RPC endpoint and binds the Hospital contract.
    /// Call [`EthLedger::start_event_pump`] before serving requests.
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())?.interval(config.poll_interval);
        let chain_id = provider.get_chainid().await?.as_u64();

        let wallet = config.signer_key.parse::<LocalWallet>()?.with_chain_id(chain_id);
        let signer_address = wallet.address();
        let client = Arc::new(NonceManagerMiddleware::new(
            SignerMiddleware::new(provider, wallet),
            signer_address,
        ));
        // Primed once here so the first concurrent writes share one counter.
        let next_nonce = client.initialize_nonce(None).await?;
        let hospital = HospitalContract::new(config.contracts.hospital, client.clone());

        info!(
            chain_id,
            signer = ?signer_address,
            %next_nonce,
            hospital = ?config.contracts.hospital,
            "connected to ledger"
        );

        Ok(Self {
            client,
            hospital,
            hub: EventHub::default(),
            confirmations: config.confirmations,
            poll_interval: config.poll_interval,
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// Streams Hospital contract logs into the event hub until [`EthLedger::shutdown`].
    ///
    /// The log filter is re-installed after a stream error; events emitted
    /// while it is down are not replayed.
    pub fn start_event_pump(&self) -> JoinHandle<()> {
        let hospital = self.hospital.clone();
        let hub = self.hub.clone();
        let shutdown = self.shutdown.clone();
        let retry_after = self.poll_interval;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        info!("ledger event pump stopped");
                        return;
                    }
                    result = pump_events(&hospital, &hub) => {
                        match result {
                            Ok(()) => warn!("hospital event stream ended, re-subscribing"),
                            Err(e) => warn!(error = %e, "hospital event stream failed, re-subscribing"),
                        }
                    }
                }
                tokio::time::sleep(retry_after).await;
            }
        })
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    async fn submit(&self, operation: &'static str, call: ContractCall<SignerClient, ()>) -> Result<TxReceipt, LedgerError> {
        let pending = call.send().await.map_err(|e| LedgerError::Call {
            operation,
            reason: e.to_string(),
        })?;
        let tx_hash = pending.tx_hash();
        info!(operation, ?tx_hash, "transaction sent");

        let receipt = pending
            .confirmations(self.confirmations)
            .await
            .map_err(|e| LedgerError::Call {
                operation,
                reason: e.to_string(),
            })?
            .ok_or(LedgerError::Dropped { operation, tx_hash })?;

        if receipt.status != Some(U64::one()) {
            error!(operation, ?tx_hash, "transaction failed during execution");
            return Err(LedgerError::Reverted { operation, tx_hash });
        }

        let block_number = receipt.block_number.map(|b| b.as_u64());
        info!(operation, ?tx_hash, ?block_number, "transaction confirmed");
        Ok(TxReceipt { tx_hash, block_number })
    }
}

async fn pump_events(
    hospital: &HospitalContract<SignerClient>,
    hub: &EventHub,
) -> Result<(), ContractError<SignerClient>> {
    let events = hospital.events();
    let mut stream = events.stream_with_meta().await?;
    while let Some(item) = stream.next().await {
        let (event, meta) = item?;
        let event = LedgerEvent {
            tx_hash: meta.transaction_hash,
            kind: decode_event(event),
        };
        let delivered = hub.publish(event.clone());
        debug!(event = event.kind.name(), tx_hash = ?event.tx_hash, delivered, "ledger event");
    }
    Ok(())
}

fn decode_event(event: HospitalContractEvents) -> LedgerEventKind {
    match event {
        HospitalContractEvents::DoctorRegisteredFilter(e) => LedgerEventKind::DoctorRegistered(DoctorRegistered {
            did: e.did,
            cid: e.cid,
            specialization: e.specialization,
            first_login: e.first_login,
        }),
        HospitalContractEvents::PatientRegisteredFilter(e) => LedgerEventKind::PatientRegistered(PatientRegistered {
            did: e.did,
            cid: e.cid,
            first_login: e.first_login,
            assigned_doctor_did: e.assigned_doctor_did,
            success: e.success,
        }),
        HospitalContractEvents::SessionCreatedFilter(e) => LedgerEventKind::SessionCreated(SessionCreated {
            user_did: e.user_did,
            expiry: e.expiry,
            success: e.success,
        }),
        HospitalContractEvents::DoctorLoginStatusFilter(e) => LedgerEventKind::DoctorLoginStatus(DoctorLoginStatus {
            did: e.did,
            cid: e.cid,
            is_first_login: e.is_first_login,
            success: e.success,
            message: e.message,
        }),
    }
}

fn call_failed<M: Middleware>(operation: &'static str) -> impl FnOnce(ContractError<M>) -> LedgerError {
    move |e| LedgerError::Call {
        operation,
        reason: e.to_string(),
    }
}

#[async_trait]
impl Ledger for EthLedger {
    async fn is_user_registered(&self, uid: &str) -> Result<bool, LedgerError> {
        self.hospital
            .is_user_registered(uid.to_string())
            .call()
            .await
            .map_err(call_failed("isUserRegistered"))
    }

    async fn register_doctor(&self, uid: &str, cid: &str, specialization: &str) -> Result<TxReceipt, LedgerError> {
        let call = self
            .hospital
            .register_doctor(uid.to_string(), cid.to_string(), specialization.to_string());
        self.submit("registerDoctor", call).await
    }

    async fn register_patient(
        &self,
        uid: &str,
        cid: &str,
        issue: &str,
        is_serious: bool,
    ) -> Result<TxReceipt, LedgerError> {
        let call = self
            .hospital
            .register_patient(uid.to_string(), cid.to_string(), issue.to_string(), is_serious);
        self.submit("registerPatient", call).await
    }

    async fn create_session(
        &self,
        did: &str,
        uid: &str,
        key_hash: [u8; 32],
        duration_secs: u64,
    ) -> Result<TxReceipt, LedgerError> {
        let call = self.hospital.create_session(
            did.to_string(),
            uid.to_string(),
            key_hash,
            U256::from(duration_secs),
        );
        self.submit("createSession", call).await
    }

    async fn validate_login(&self, did: &str, uid: &str, key_hash: [u8; 32]) -> Result<TxReceipt, LedgerError> {
        let call = self
            .hospital
            .validate_login(did.to_string(), uid.to_string(), key_hash);
        self.submit("validateLogin", call).await
    }

    async fn set_doctor_public_key(&self, did: &str, public_key: &str) -> Result<TxReceipt, LedgerError> {
        let call = self
            .hospital
            .set_doctor_public_key(did.to_string(), public_key.to_string());
        self.submit("setDoctorPublicKey", call).await
    }

    async fn block_number(&self) -> Result<u64, LedgerError> {
        self.client
            .get_block_number()
            .await
            .map(|n| n.as_u64())
            .map_err(|e| LedgerError::Call {
                operation: "eth_blockNumber",
                reason: e.to_string(),
            })
    }

    fn events(&self) -> &EventHub {
        &self.hub
    }
}
