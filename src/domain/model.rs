//! Validated inputs for the three use cases, and the profile each one hashes.

use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct DoctorRegistration {
    pub email: String,
    pub specialization: String,
    pub govt_id: String,
    pub random_words: String,
}

impl DoctorRegistration {
    /// The fields that go into the data-hash chain.
    pub fn profile(&self) -> Value {
        doctor_profile(&self.email, &self.govt_id)
    }
}

#[derive(Debug, Clone)]
pub struct PatientRegistration {
    pub govt_id: String,
    pub name: String,
    pub email: String,
    pub phone_number: Value,
    pub age: Value,
    pub address: String,
    pub issue: String,
    pub is_serious: bool,
    pub random_words: String,
}

impl PatientRegistration {
    pub fn profile(&self) -> Value {
        json!({
            "govtId": self.govt_id,
            "name": self.name,
            "email": self.email,
            "phoneNumber": self.phone_number,
            "age": self.age,
            "address": self.address,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DoctorLogin {
    pub email: String,
    pub govt_id: String,
    pub random_words: String,
    pub registration_code: String,
    pub did: String,
}

impl DoctorLogin {
    pub fn profile(&self) -> Value {
        doctor_profile(&self.email, &self.govt_id)
    }
}

// Registration and login must hash exactly the same shape.
fn doctor_profile(email: &str, govt_id: &str) -> Value {
    json!({ "email": email, "govtId": govt_id })
}
