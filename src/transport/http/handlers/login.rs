use crate::app::ServiceError;
use crate::domain::DoctorLogin;
use crate::transport::http::handlers::common::json_body;
use crate::transport::http::types::{
    AppState, DoctorLoginData, DoctorLoginRequest, DoctorLoginResponse,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

#[utoipa::path(
    post,
    path = "/doctor/login",
    request_body = DoctorLoginRequest,
    responses(
        (status = 201, description = "Login accepted; privateKey is present only on first login", body = DoctorLoginResponse),
        (status = 400, description = "Missing fields or malformed body", body = ErrorResponse),
        (status = 401, description = "Session or login rejected by the ledger", body = ErrorResponse),
        (status = 500, description = "Ledger or event failure", body = ErrorResponse)
    )
)]
pub async fn doctor_login_handler(
    State(state): State<AppState>,
    request: Result<Json<DoctorLoginRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DoctorLoginResponse>), ServiceError> {
    let input = DoctorLogin::try_from(json_body(request)?)?;
    let outcome = state.service.login_doctor(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(DoctorLoginResponse {
            message: outcome.message,
            doctor_data: DoctorLoginData {
                doctor_did: outcome.doctor_did,
                user_uid: outcome.user_uid,
                is_first_login: outcome.is_first_login,
                private_key: outcome.private_key,
            },
        }),
    ))
}
