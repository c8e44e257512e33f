use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, State},
    http::{header::USER_AGENT, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::{
    ContactRequest, LeadSummary, Product, RequestOrigin, Statistics, StockAdjustmentRequest,
};
use crate::response::Envelope;
use crate::services::{
    CatalogService, HealthService, LeadService, LeadSubmission, StatisticsService,
    PRODUCT_NOT_FOUND,
};
use crate::store::Store;

/// Shared application state injected into handlers.
pub struct AppState<S: Store> {
    /// Backend holding products and leads.
    pub store: S,
    /// Application configuration.
    pub config: Config,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    fn catalog(&self) -> CatalogService<'_, S> {
        CatalogService::new(&self.store, &self.config.flagship_model)
    }

    fn leads(&self) -> LeadService<'_, S> {
        LeadService::new(&self.store, &self.config.flagship_model)
    }
}

/// GET /api/health
///
/// Reports whether the store is reachable. Always answers 200: a degraded
/// store is reported through `status`, not through the HTTP status.
pub async fn health<S: Store>(State(state): State<Arc<AppState<S>>>) -> Envelope {
    let report = HealthService::new(&state.store).check().await;

    Envelope::success()
        .with_status(report.status())
        .with_database(report.backend)
}

/// GET /api/produtos
pub async fn list_products<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Envelope<Vec<Product>>, AppError> {
    let products = state
        .catalog()
        .list_active()
        .await
        .context("Erro ao buscar produtos no banco de dados")?;

    tracing::info!("Found {} products", products.len());
    let total = products.len();
    Ok(Envelope::ok(products).with_total(total))
}

/// GET /api/produtos/:id
///
/// Ids that are not integers cannot match any product and answer 404.
pub async fn get_product<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Envelope<Product>, AppError> {
    let id = parse_product_id(&id)?;
    tracing::info!("Fetching product {}", id);

    let product = state
        .catalog()
        .get_by_id(id)
        .await
        .context("Erro ao buscar produto no banco de dados")?;

    Ok(Envelope::ok(product))
}

/// PUT /api/produtos/:id/estoque
pub async fn update_stock<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<StockAdjustmentRequest>, JsonRejection>,
) -> Result<Envelope<Product>, AppError> {
    let Json(body) = payload.map_err(bad_json)?;
    let id = parse_product_id(&id)?;
    let operation = body.operacao.unwrap_or_default();

    tracing::info!(
        "PUT /produtos/{}/estoque - {} {:?}",
        id,
        operation,
        body.quantidade
    );

    let quantity = parse_quantity(body.quantidade.as_ref());

    let product = state
        .catalog()
        .adjust_stock(id, quantity, &operation)
        .await
        .context("Erro ao atualizar estoque no banco de dados")?;

    Ok(Envelope::ok(product).with_message("Estoque atualizado com sucesso"))
}

/// POST /api/contatos
pub async fn create_contact<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Envelope, AppError> {
    let Json(body) = payload.map_err(bad_json)?;
    tracing::info!(
        "POST /contatos - {} - {}",
        body.nome.as_deref().unwrap_or_default(),
        body.email.as_deref().unwrap_or_default()
    );

    let origin = request_origin(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let submission = LeadSubmission {
        name: body.nome,
        email: body.email,
        phone: body.telefone,
        message: body.mensagem,
        product_id: body.produto_id,
    };

    let id = state
        .leads()
        .submit(submission, origin)
        .await
        .context("Erro ao registrar contato no banco de dados")?;

    Ok(Envelope::success()
        .with_message("Contato registrado com sucesso")
        .with_contact_id(id))
}

/// GET /api/contatos
pub async fn list_contacts<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Envelope<Vec<LeadSummary>>, AppError> {
    let leads = state
        .leads()
        .list_recent(None)
        .await
        .context("Erro ao buscar contatos no banco de dados")?;

    tracing::info!("Found {} leads", leads.len());
    let total = leads.len();
    Ok(Envelope::ok(leads).with_total(total))
}

/// GET /api/estatisticas
pub async fn statistics<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Envelope<Statistics>, AppError> {
    let stats = StatisticsService::new(&state.store)
        .compute()
        .await
        .context("Erro ao gerar estatísticas")?;

    Ok(Envelope::ok(stats))
}

/// Fallback for unmatched routes.
pub async fn route_not_found(method: Method, uri: Uri) -> AppError {
    tracing::warn!("No route for {} {}", method, uri.path());
    AppError::RouteNotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

/// Serves the OpenAPI specification YAML file.
///
/// Reads `openapi.yml` from the working directory on each request; answers
/// 404 when the file is missing.
pub async fn serve_openapi_spec() -> impl IntoResponse {
    match tokio::fs::read_to_string("openapi.yml").await {
        Ok(content) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/yaml")],
            content,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("openapi.yml unavailable: {}", e);
            (StatusCode::NOT_FOUND, "OpenAPI spec not found").into_response()
        }
    }
}

/// Serves the Swagger UI page pointed at [`serve_openapi_spec`].
pub async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>TechBook API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.yml",
                dom_id: '#swagger-ui',
                deepLinking: true
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}

fn bad_json(rejection: JsonRejection) -> AppError {
    tracing::debug!("Rejected request body: {}", rejection.body_text());
    AppError::BadRequest(format!("Corpo da requisição inválido: {}", rejection.body_text()))
}

fn parse_product_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))
}

/// Accepts integers and numeric strings, like the storefront sends them.
/// Anything else yields `None`, which the catalog rejects.
fn parse_quantity(raw: Option<&serde_json::Value>) -> Option<i64> {
    match raw {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Source address and user agent of the request, `N/A` when unknown.
///
/// The first `X-Forwarded-For` entry wins over the socket peer address.
fn request_origin(headers: &HeaderMap, peer: Option<SocketAddr>) -> RequestOrigin {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let ip_address = forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| RequestOrigin::UNKNOWN.to_string());

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(RequestOrigin::UNKNOWN)
        .to_string();

    RequestOrigin {
        ip_address,
        user_agent,
    }
}
