use axum::extract::{Path, State};
use creg_domain::actions::Action;
use creg_domain::constants::CERTS_TAG;
use creg_kernel::operations::CertificateOutput;
use creg_kernel::server::{ApiError, ApiState, Caller, Envelope};
use tracing::info;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(read_certificate))
        .routes(routes!(issue_certificate))
        .routes(routes!(renew_certificate))
}

async fn dispatch(
    state: &ApiState,
    caller: &Caller,
    key: &str,
    action: Action,
) -> Result<Envelope<CertificateOutput>, ApiError> {
    let registry = state.registry();
    caller.authorize(&registry, Some(key), action)?;

    let entry = registry
        .certificate(key)
        .ok_or_else(|| ApiError::UnknownCertificate { key: key.to_owned() })?;

    let output = match action {
        Action::Read => state.operations.read(&registry, entry).await?,
        Action::Issue => state.operations.issue(&registry, entry).await?,
        Action::Renew => state.operations.renew(&registry, entry).await?,
        Action::Health => return Err("health is not a certificate action".into()),
    };
    if action != Action::Read {
        info!(key, %action, caller = %caller.address(), "Certificate operation completed");
    }
    Ok(Envelope::ok(output))
}

#[utoipa::path(
    get,
    path = "/api/certs/{key}",
    params(
        ("key" = String, Path, description = "Certificate key"),
        ("x-api-token" = String, Header, description = "API token"),
    ),
    responses(
        (status = OK, description = "Issued full chain", body = Envelope<CertificateOutput>),
        (status = UNAUTHORIZED, description = "Unknown token"),
        (status = FORBIDDEN, description = "Token may not read this certificate"),
        (status = NOT_FOUND, description = "Certificate is not declared or not issued yet"),
    ),
    tag = CERTS_TAG,
)]
pub(crate) async fn read_certificate(
    State(state): State<ApiState>,
    caller: Caller,
    Path(key): Path<String>,
) -> Result<Envelope<CertificateOutput>, ApiError> {
    dispatch(&state, &caller, &key, Action::Read).await
}

#[utoipa::path(
    post,
    path = "/api/certs/{key}/issue",
    params(
        ("key" = String, Path, description = "Certificate key"),
        ("x-api-token" = String, Header, description = "API token"),
    ),
    responses(
        (status = OK, description = "Certificate issued", body = Envelope<CertificateOutput>),
        (status = UNAUTHORIZED, description = "Unknown token"),
        (status = FORBIDDEN, description = "Token may not issue this certificate"),
        (status = NOT_FOUND, description = "Certificate is not declared"),
        (status = BAD_GATEWAY, description = "Certbot failed"),
    ),
    tag = CERTS_TAG,
)]
pub(crate) async fn issue_certificate(
    State(state): State<ApiState>,
    caller: Caller,
    Path(key): Path<String>,
) -> Result<Envelope<CertificateOutput>, ApiError> {
    dispatch(&state, &caller, &key, Action::Issue).await
}

#[utoipa::path(
    post,
    path = "/api/certs/{key}/renew",
    params(
        ("key" = String, Path, description = "Certificate key"),
        ("x-api-token" = String, Header, description = "API token"),
    ),
    responses(
        (status = OK, description = "Certificate renewed", body = Envelope<CertificateOutput>),
        (status = UNAUTHORIZED, description = "Unknown token"),
        (status = FORBIDDEN, description = "Token may not renew this certificate"),
        (status = NOT_FOUND, description = "Certificate is not declared"),
        (status = BAD_GATEWAY, description = "Certbot failed"),
    ),
    tag = CERTS_TAG,
)]
pub(crate) async fn renew_certificate(
    State(state): State<ApiState>,
    caller: Caller,
    Path(key): Path<String>,
) -> Result<Envelope<CertificateOutput>, ApiError> {
    dispatch(&state, &caller, &key, Action::Renew).await
}
