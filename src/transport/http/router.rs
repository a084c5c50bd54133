use crate::transport::http::handlers::{health, login, register};
use crate::transport::http::types::{
    ApiResponse, AppState, DoctorLoginData, DoctorLoginRequest, DoctorLoginResponse, DoctorRegistrationData,
    DoctorRegistrationResponse, ErrorResponse, PatientData, PatientRegistrationResponse, RegisterDoctorRequest,
    RegisterPatientRequest,
};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        register::register_doctor_handler,
        register::register_patient_handler,
        login::doctor_login_handler
    ),
    components(schemas(
        ApiResponse,
        ErrorResponse,
        RegisterDoctorRequest,
        RegisterPatientRequest,
        DoctorLoginRequest,
        DoctorRegistrationResponse,
        DoctorRegistrationData,
        PatientRegistrationResponse,
        PatientData,
        DoctorLoginResponse,
        DoctorLoginData
    )),
    tags((name = "hospital", description = "Doctor and patient registration, doctor login"))
)]
pub struct ApiDoc;

fn register_routes() -> Router<AppState> {
    Router::new()
        .route("/doctor", post(register::register_doctor_handler))
        .route("/patient", post(register::register_patient_handler))
}

fn doctor_routes() -> Router<AppState> {
    Router::new().route("/login", post(login::doctor_login_handler))
}

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .nest("/register", register_routes())
        .nest("/doctor", doctor_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
