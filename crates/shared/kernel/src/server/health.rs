use super::caller::Caller;
use super::response::{ApiError, Envelope};
use super::state::ApiState;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use creg_domain::actions::Action;
use creg_domain::constants::SYSTEM_TAG;
use serde::Serialize;
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub(super) struct HealthResponse {
    /// Status
    status: &'static str,
    /// Version
    version: &'static str,
    /// Uptime in seconds
    uptime: u64,
    /// Number of declared certificates
    certificates: usize,
}

#[utoipa::path(
    get,
    path = "/health",
    params(("x-api-token" = String, Header, description = "API token")),
    responses(
        (status = OK, description = "Healthcheck endpoint", body = Envelope<HealthResponse>),
        (status = UNAUTHORIZED, description = "Unknown token"),
        (status = FORBIDDEN, description = "Token may not check health from this address"),
    ),
    tag = SYSTEM_TAG,
)]
pub(super) async fn health_handler(
    State(state): State<ApiState>,
    caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let registry = state.registry();
    caller.authorize(&registry, None, Action::Health)?;

    let body = HealthResponse {
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.uptime_secs(),
        certificates: registry.certificates().len(),
    };

    Ok((
        [
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (header::PRAGMA, "no-cache"),
        ],
        Envelope::ok(body),
    ))
}
