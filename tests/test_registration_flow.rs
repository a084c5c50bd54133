//! Registration through the HTTP surface against a simulated Hospital contract.

mod common;

use common::{doctor_body, patient_body, spawn_app, spawn_app_with_timeout, Behavior};
use hospital_ledger_gateway::crypto::{derive_data_hash, derive_user_uid};
use hospital_ledger_gateway::ContentStore;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn doctor_registration_returns_did_and_stores_data_hash() {
    let app = spawn_app().await;

    let (status, body) = app.post("/register/doctor", &doctor_body("D-100", "cardiology")).await;
    assert_eq!(status, 201, "body: {body}");

    let data = &body["doctorData"];
    let did = data["doctorDID"].as_str().unwrap();
    assert!(!did.is_empty());
    assert_eq!(data["specialization"], "cardiology");
    assert_eq!(data["firstLogin"], true);
    assert_eq!(data["userUID"], derive_user_uid("D-100", common::UID_SECRET));
    assert!(body["transactionHash"].as_str().unwrap().starts_with("0x"));

    // The registration code went out of band and the stored blob is the
    // data hash that code reproduces.
    let code = app.delivery.code_for(did).expect("code delivered");
    assert_eq!(code.len(), 24);
    let record = app.ledger.doctor(did).unwrap();
    let stored = app.store.fetch(&record.cid).await.unwrap();
    let profile = json!({ "email": "d-100@hospital.example", "govtId": "D-100" });
    assert_eq!(stored, json!(derive_data_hash(&profile, "amber falcon quiet harbor", &code)));
}

#[tokio::test]
async fn duplicate_doctor_is_rejected_without_a_second_write() {
    let app = spawn_app().await;

    let (status, _) = app.post("/register/doctor", &doctor_body("D-200", "neurology")).await;
    assert_eq!(status, 201);
    let stored_before = app.store.len().await;

    let (status, body) = app.post("/register/doctor", &doctor_body("D-200", "neurology")).await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "Doctor already registered.");
    assert_eq!(app.ledger.register_calls(), 1);
    assert_eq!(app.store.len().await, stored_before);
}

#[tokio::test]
async fn missing_fields_are_listed() {
    let app = spawn_app().await;

    let (status, body) = app
        .post("/register/doctor", &json!({ "email": "x@y.z", "govtId": "" }))
        .await;
    assert_eq!(status, 400);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("All fields are required."));
    assert!(error.contains("specialization"));
    assert!(error.contains("govtId"));
    assert!(error.contains("randomWords"));
    assert_eq!(app.ledger.register_calls(), 0);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = spawn_app().await;

    let response = app
        .http
        .post(app.url("/register/patient"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn patient_is_assigned_a_doctor_with_matching_specialization() {
    let app = spawn_app().await;

    let (_, doctor) = app.post("/register/doctor", &doctor_body("D-300", "oncology")).await;
    let doctor_did = doctor["doctorData"]["doctorDID"].as_str().unwrap().to_string();

    let (status, body) = app.post("/register/patient", &patient_body("P-300", "oncology")).await;
    assert_eq!(status, 201, "body: {body}");
    let data = &body["PatientData"];
    assert_eq!(data["assignedDoctorDID"], doctor_did);
    assert!(!data["patientDID"].as_str().unwrap().is_empty());
    assert_eq!(data["firstLogin"], true);
}

#[tokio::test]
async fn patient_without_available_doctor_gets_success_false() {
    let app = spawn_app().await;

    let (status, body) = app.post("/register/patient", &patient_body("P-400", "dermatology")).await;
    assert_eq!(status, 201);
    assert_eq!(body["success"], false);
    assert!(body["transactionHash"].as_str().is_some());
    assert!(body.get("PatientData").is_none());
    assert_eq!(app.delivery.count(), 0);
}

#[tokio::test]
async fn patient_with_is_serious_false_is_accepted() {
    let app = spawn_app().await;
    app.post("/register/doctor", &doctor_body("D-500", "general")).await;

    let mut body = patient_body("P-500", "general");
    body["isSerious"] = json!(false);
    let (status, _) = app.post("/register/patient", &body).await;
    assert_eq!(status, 201);
}

#[tokio::test]
async fn ledger_write_failure_is_a_server_error() {
    let app = spawn_app().await;
    app.ledger.set_behavior(Behavior {
        fail_writes: true,
        ..Behavior::default()
    });

    let (status, body) = app.post("/register/doctor", &doctor_body("D-600", "cardiology")).await;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("registerDoctor"));
}

#[tokio::test]
async fn missing_event_times_out() {
    let app = spawn_app_with_timeout(Duration::from_millis(200)).await;
    app.ledger.set_behavior(Behavior {
        silent: true,
        ..Behavior::default()
    });

    let (status, body) = app.post("/register/doctor", &doctor_body("D-700", "cardiology")).await;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("DoctorRegistered"));
    // No waiter is left behind on the hub.
    assert_eq!(app.ledger.hub().subscriber_count(), 0);
}

#[tokio::test]
async fn events_from_other_transactions_are_ignored() {
    let app = spawn_app().await;
    app.ledger.set_behavior(Behavior {
        decoy: true,
        ..Behavior::default()
    });

    let (status, body) = app.post("/register/doctor", &doctor_body("D-800", "cardiology")).await;
    assert_eq!(status, 201);
    assert_ne!(body["doctorData"]["doctorDID"], "did:decoy");
}

#[tokio::test]
async fn concurrent_registrations_each_get_their_own_did() {
    let app = spawn_app().await;

    let first = doctor_body("D-901", "cardiology");
    let second = doctor_body("D-902", "cardiology");
    let (a, b) = tokio::join!(
        app.post("/register/doctor", &first),
        app.post("/register/doctor", &second),
    );
    assert_eq!(a.0, 201);
    assert_eq!(b.0, 201);
    assert_ne!(a.1["doctorData"]["doctorDID"], b.1["doctorData"]["doctorDID"]);
    assert_ne!(a.1["transactionHash"], b.1["transactionHash"]);
}
