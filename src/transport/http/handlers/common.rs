use crate::app::ServiceError;
use crate::domain::{DoctorLogin, DoctorRegistration, PatientRegistration};
use crate::transport::http::types::{DoctorLoginRequest, RegisterDoctorRequest, RegisterPatientRequest};
use axum::extract::rejection::JsonRejection;
use axum::Json;
use primitive_types::H256;
use serde_json::Value as JsonValue;

pub fn json_body<T>(request: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    request
        .map(|Json(body)| body)
        .map_err(|e| ServiceError::InvalidBody(e.body_text()))
}

pub fn tx_hash_hex(tx_hash: &H256) -> String {
    format!("0x{}", hex::encode(tx_hash.as_bytes()))
}

/// Collects every missing field so the 400 names all of them at once.
/// Empty (whitespace-only) strings and JSON nulls count as missing.
#[derive(Default)]
struct Fields {
    missing: Vec<&'static str>,
}

impl Fields {
    fn text(&mut self, name: &'static str, value: Option<String>) -> String {
        match value {
            Some(v) if !v.trim().is_empty() => v,
            _ => {
                self.missing.push(name);
                String::new()
            }
        }
    }

    fn scalar(&mut self, name: &'static str, value: Option<JsonValue>) -> JsonValue {
        match value {
            Some(JsonValue::String(s)) if !s.trim().is_empty() => JsonValue::String(s),
            Some(n @ JsonValue::Number(_)) => n,
            _ => {
                self.missing.push(name);
                JsonValue::Null
            }
        }
    }

    fn flag(&mut self, name: &'static str, value: Option<bool>) -> bool {
        value.unwrap_or_else(|| {
            self.missing.push(name);
            false
        })
    }

    fn finish<T>(self, value: T) -> Result<T, ServiceError> {
        if self.missing.is_empty() {
            Ok(value)
        } else {
            Err(ServiceError::MissingFields(self.missing))
        }
    }
}

impl TryFrom<RegisterDoctorRequest> for DoctorRegistration {
    type Error = ServiceError;

    fn try_from(req: RegisterDoctorRequest) -> Result<Self, Self::Error> {
        let mut f = Fields::default();
        let value = DoctorRegistration {
            email: f.text("email", req.email),
            specialization: f.text("specialization", req.specialization),
            govt_id: f.text("govtId", req.govt_id),
            random_words: f.text("randomWords", req.random_words),
        };
        f.finish(value)
    }
}

impl TryFrom<RegisterPatientRequest> for PatientRegistration {
    type Error = ServiceError;

    fn try_from(req: RegisterPatientRequest) -> Result<Self, Self::Error> {
        let mut f = Fields::default();
        let value = PatientRegistration {
            govt_id: f.text("govtId", req.govt_id),
            name: f.text("name", req.name),
            email: f.text("email", req.email),
            phone_number: f.scalar("phoneNumber", req.phone_number),
            age: f.scalar("age", req.age),
            address: f.text("address", req.address),
            issue: f.text("issue", req.issue),
            is_serious: f.flag("isSerious", req.is_serious),
            random_words: f.text("randomWords", req.random_words),
        };
        f.finish(value)
    }
}

impl TryFrom<DoctorLoginRequest> for DoctorLogin {
    type Error = ServiceError;

    fn try_from(req: DoctorLoginRequest) -> Result<Self, Self::Error> {
        let mut f = Fields::default();
        let value = DoctorLogin {
            email: f.text("email", req.email),
            govt_id: f.text("govtId", req.govt_id),
            random_words: f.text("randomWords", req.random_words),
            registration_code: f.text("registrationCode", req.registration_code),
            did: f.text("did", req.did),
        };
        f.finish(value)
    }
}
