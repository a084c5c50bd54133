use crate::app::{PatientRegistrationOutcome, ServiceError};
use crate::domain::{DoctorRegistration, PatientRegistration};
use crate::transport::http::handlers::common::{json_body, tx_hash_hex};
use crate::transport::http::types::{
    AppState, DoctorRegistrationData, DoctorRegistrationResponse, PatientData,
    PatientRegistrationResponse, RegisterDoctorRequest, RegisterPatientRequest,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

#[utoipa::path(
    post,
    path = "/register/doctor",
    request_body = RegisterDoctorRequest,
    responses(
        (status = 201, description = "Doctor registered on the ledger", body = DoctorRegistrationResponse),
        (status = 400, description = "Missing fields or malformed body", body = ErrorResponse),
        (status = 409, description = "Doctor already registered", body = ErrorResponse),
        (status = 500, description = "Storage, ledger or event failure", body = ErrorResponse)
    )
)]
pub async fn register_doctor_handler(
    State(state): State<AppState>,
    request: Result<Json<RegisterDoctorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DoctorRegistrationResponse>), ServiceError> {
    let input = DoctorRegistration::try_from(json_body(request)?)?;
    let outcome = state.service.register_doctor(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(DoctorRegistrationResponse {
            message: "Doctor registered successfully".to_string(),
            transaction_hash: tx_hash_hex(&outcome.tx_hash),
            doctor_data: DoctorRegistrationData {
                doctor_did: outcome.doctor_did,
                specialization: outcome.specialization,
                user_uid: outcome.user_uid,
                first_login: outcome.first_login,
            },
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/register/patient",
    request_body = RegisterPatientRequest,
    responses(
        (status = 201, description = "Patient registered; success=false when no doctor could be assigned", body = PatientRegistrationResponse),
        (status = 400, description = "Missing fields or malformed body", body = ErrorResponse),
        (status = 409, description = "Patient already registered", body = ErrorResponse),
        (status = 500, description = "Storage, ledger or event failure", body = ErrorResponse)
    )
)]
pub async fn register_patient_handler(
    State(state): State<AppState>,
    request: Result<Json<RegisterPatientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PatientRegistrationResponse>), ServiceError> {
    let input = PatientRegistration::try_from(json_body(request)?)?;

    let body = match state.service.register_patient(input).await? {
        PatientRegistrationOutcome::Registered {
            tx_hash,
            patient_did,
            assigned_doctor_did,
            first_login,
        } => PatientRegistrationResponse::Registered {
            message: "Patient registered successfully".to_string(),
            transaction_hash: tx_hash_hex(&tx_hash),
            patient_data: PatientData {
                patient_did,
                assigned_doctor_did,
                first_login,
            },
        },
        PatientRegistrationOutcome::Rejected { tx_hash } => PatientRegistrationResponse::Rejected {
            message: "Patient registration failed".to_string(),
            transaction_hash: tx_hash_hex(&tx_hash),
            success: false,
        },
    };

    Ok((StatusCode::CREATED, Json(body)))
}
