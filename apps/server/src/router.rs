use axum::Router;
use creg_kernel::server::ApiState;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

#[derive(OpenApi)]
#[openapi(
    info(title = "Certificate Registry", description = "Token-gated certificate lifecycle API"),
    tags(
        (name = "System", description = "Liveness"),
        (name = "Certificates", description = "Read, issue and renew declared certificates"),
    )
)]
struct ApiDoc;

/// Assembles every route, the trace layer and the Scalar docs at `/api`.
pub(crate) fn init(state: ApiState) -> Router {
    let (routes, api_doc) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(creg_kernel::server::router::system_router())
        .merge(creg_certs::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .split_for_parts();

    Router::new().merge(routes).merge(Scalar::with_url("/api", api_doc))
}
