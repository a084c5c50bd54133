use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Ledger and content store reachable", body = ApiResponse),
        (status = 503, description = "Ledger or content store unreachable", body = ApiResponse)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    let ledger = state.service.ledger().block_number();
    let store = state.service.store().ping();

    match tokio::join!(ledger, store) {
        (Ok(block), Ok(version)) => (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(serde_json::json!({ "ledgerBlock": block, "storeVersion": version })),
                error: None,
            }),
        )
            .into_response(),
        (ledger, store) => {
            let mut problems = Vec::new();
            if let Err(e) = &ledger {
                problems.push(format!("ledger: {}", e));
            }
            if let Err(e) = &store {
                problems.push(format!("store: {}", e));
            }
            tracing::warn!(problems = ?problems, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    success: false,
                    data: Some(serde_json::json!({
                        "ledgerBlock": ledger.ok(),
                        "storeVersion": store.ok(),
                    })),
                    error: Some(problems.join("; ")),
                }),
            )
                .into_response()
        }
    }
}
