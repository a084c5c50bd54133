use crate::app::{HospitalService, ServiceError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<HospitalService>,
}

// --- Requests ---
//
// Every field is optional at the wire level so a missing field is reported
// as a 400 listing all missing names, not as a deserialization failure.

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDoctorRequest {
    pub email: Option<String>,
    pub specialization: Option<String>,
    pub govt_id: Option<String>,
    pub random_words: Option<String>,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPatientRequest {
    pub govt_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    /// String or number.
    #[schema(value_type = Option<String>)]
    pub phone_number: Option<JsonValue>,
    /// String or number.
    #[schema(value_type = Option<u32>)]
    pub age: Option<JsonValue>,
    pub address: Option<String>,
    pub issue: Option<String>,
    pub is_serious: Option<bool>,
    pub random_words: Option<String>,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorLoginRequest {
    pub email: Option<String>,
    pub govt_id: Option<String>,
    pub random_words: Option<String>,
    pub registration_code: Option<String>,
    pub did: Option<String>,
}

// --- Responses ---

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorRegistrationResponse {
    pub message: String,
    pub transaction_hash: String,
    pub doctor_data: DoctorRegistrationData,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct DoctorRegistrationData {
    #[serde(rename = "doctorDID")]
    pub doctor_did: String,
    pub specialization: String,
    #[serde(rename = "userUID")]
    pub user_uid: String,
    #[serde(rename = "firstLogin")]
    pub first_login: bool,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(untagged)]
pub enum PatientRegistrationResponse {
    Registered {
        message: String,
        #[serde(rename = "transactionHash")]
        transaction_hash: String,
        #[serde(rename = "PatientData")]
        patient_data: PatientData,
    },
    Rejected {
        message: String,
        #[serde(rename = "transactionHash")]
        transaction_hash: String,
        success: bool,
    },
}

#[derive(Serialize, Debug, ToSchema)]
pub struct PatientData {
    #[serde(rename = "patientDID")]
    pub patient_did: String,
    #[serde(rename = "assignedDoctorDID")]
    pub assigned_doctor_did: String,
    #[serde(rename = "firstLogin")]
    pub first_login: bool,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorLoginResponse {
    pub message: String,
    pub doctor_data: DoctorLoginData,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct DoctorLoginData {
    #[serde(rename = "doctorDID")]
    pub doctor_did: String,
    #[serde(rename = "userUID")]
    pub user_uid: String,
    #[serde(rename = "isFirstLogin")]
    pub is_first_login: bool,
    /// PEM private key, returned once on first login.
    #[serde(rename = "privateKey", skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::MissingFields(_) | ServiceError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ServiceError::AlreadyRegistered { .. } => StatusCode::CONFLICT,
            ServiceError::LoginRejected(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Ledger(_)
            | ServiceError::Storage(_)
            | ServiceError::Crypto(_)
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
