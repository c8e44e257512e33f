use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};
use uuid::Uuid;

use crate::errors::AppError;
use crate::handlers::{self, AppState};
use crate::store::Store;

/// Builds the HTTP router over `state`.
///
/// With `rate_limited`, the API routes get a per-IP limiter keyed on the
/// forwarded or peer address; the server must then be run with connect info.
/// The health check is never rate limited.
pub fn build_router<S: Store>(
    state: Arc<AppState<S>>,
    rate_limited: bool,
) -> anyhow::Result<Router> {
    let body_limit = state.config.request_body_limit_bytes;

    let api = Router::new()
        // API Documentation
        .route("/docs", get(handlers::serve_swagger_ui))
        .route("/api-docs/openapi.yml", get(handlers::serve_openapi_spec))
        // Catalog
        .route("/api/produtos", get(handlers::list_products::<S>))
        .route("/api/produtos/:id", get(handlers::get_product::<S>))
        .route("/api/produtos/:id/estoque", put(handlers::update_stock::<S>))
        // Leads
        .route(
            "/api/contatos",
            post(handlers::create_contact::<S>).get(handlers::list_contacts::<S>),
        )
        .route("/api/estatisticas", get(handlers::statistics::<S>))
        .layer(RequestBodyLimitLayer::new(body_limit));

    let api = if rate_limited {
        let limits = &state.config.rate_limit;
        let governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .per_millisecond(limits.replenish_interval_ms())
                .burst_size(limits.burst_size)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
                .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration"))?,
        );
        tracing::info!(
            "Rate limiting: {} req/s per IP (one slot every {} ms), burst of {}",
            limits.per_second,
            limits.replenish_interval_ms(),
            limits.burst_size
        );
        api.layer(ServiceBuilder::new().layer(GovernorLayer {
            config: governor_conf,
        }))
    } else {
        api
    };

    let app = Router::new()
        .route("/api/health", get(handlers::health::<S>))
        .merge(api)
        .fallback(handlers::route_not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_request_span)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive());

    Ok(app)
}

fn make_request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %Uuid::new_v4(),
    )
}

/// Renders a handler panic as a 500 envelope.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    AppError::InternalError(detail).into_response()
}
