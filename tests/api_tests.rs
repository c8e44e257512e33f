/// End-to-end tests of the HTTP surface over the in-memory store.
/// Requests go through the full router (fallback, error rendering, body parsing)
/// without binding a socket.
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use techbook_api::app::build_router;
use techbook_api::config::{Config, RateLimitConfig};
use techbook_api::handlers::AppState;
use techbook_api::store::MemoryStore;

fn app() -> Router {
    let state = Arc::new(AppState::new(MemoryStore::seeded(), Config::default()));
    build_router(state, false).unwrap()
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_connected_store() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "connected");
    assert_eq!(body["database"], "in-memory");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn product_listing_puts_flagship_first_then_price_desc() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/produtos", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 5);

    let models: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["modelo"].as_str().unwrap())
        .collect();
    assert_eq!(
        models,
        vec!["TBP-2025-I7", "TBW-2025-I9", "TBG-2025-I9", "TBA-2025-I5", "TBS-2025-I3"]
    );
    assert_eq!(body["data"][0]["preco"], 4999.0);
}

#[tokio::test]
async fn product_lookup_and_missing_product() {
    let app = app();

    let (status, body) = call(&app, Method::GET, "/api/produtos/3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nome"], "TechBook Gaming");

    let (status, body) = call(&app, Method::GET, "/api/produtos/999999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Produto não encontrado ou inativo");

    let (status, body) = call(&app, Method::GET, "/api/produtos/abc", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn stock_removal_updates_the_product() {
    let app = app();
    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/produtos/1/estoque",
        Some(json!({"quantidade": 5, "operacao": "remover"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Estoque atualizado com sucesso");
    assert_eq!(body["data"]["estoque"], 20);

    let (_, body) = call(&app, Method::GET, "/api/produtos/1", None).await;
    assert_eq!(body["data"]["estoque"], 20);
}

#[tokio::test]
async fn stock_addition_accepts_numeric_strings() {
    let app = app();
    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/produtos/5/estoque",
        Some(json!({"quantidade": "7", "operacao": "adicionar"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["estoque"], 7);
}

#[tokio::test]
async fn stock_rejects_bad_operation_and_overdraw() {
    let app = app();

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/produtos/1/estoque",
        Some(json!({"quantidade": 1, "operacao": "zerar"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Operação deve ser \"adicionar\" ou \"remover\"");

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/produtos/4/estoque",
        Some(json!({"quantidade": 30, "operacao": "remover"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // A failed removal leaves the stock untouched.
    let (_, body) = call(&app, Method::GET, "/api/produtos/4", None).await;
    assert_eq!(body["data"]["estoque"], 3);

    let (status, _) = call(
        &app,
        Method::PUT,
        "/api/produtos/999/estoque",
        Some(json!({"quantidade": 1, "operacao": "adicionar"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn contact_registration_returns_the_new_id() {
    let app = app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/contatos",
        Some(json!({"nome": "Ana", "email": "ana@x.com", "produto_id": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Contato registrado com sucesso");
    assert!(body["contato_id"].as_i64().unwrap() > 0);

    let (status, body) = call(&app, Method::GET, "/api/contatos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["nome"], "Ana");
    assert_eq!(body["data"][0]["mensagem"], "Contato via site TechBook");
    assert_eq!(body["data"][0]["produto_interesse_nome"], "TechBook Pro");
    assert_eq!(body["data"][0]["status_contato"], "novo");
}

#[tokio::test]
async fn contact_validation_failures_are_bad_requests() {
    let app = app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/contatos",
        Some(json!({"nome": "Ana"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Nome e email são obrigatórios");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/contatos",
        Some(json!({"nome": "Ana", "email": "ana@x.com", "produto_id": 999})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Produto não encontrado ou inativo");

    let (_, body) = call(&app, Method::GET, "/api/contatos", None).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/contatos")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"nome\": "))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn statistics_rank_products_by_interest() {
    let app = app();
    for product_id in [3, 3, 2] {
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/contatos",
            Some(json!({"nome": "Bia", "email": "bia@x.com", "produto_id": product_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = call(&app, Method::GET, "/api/estatisticas", None).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["total_produtos"], 5);
    assert_eq!(data["produtos_em_estoque"], 4);
    assert_eq!(data["total_interessados"], 3);

    let ranking = data["produtos_mais_procurados"].as_array().unwrap();
    assert_eq!(ranking.len(), 3);
    assert_eq!(ranking[0]["id"], 3);
    assert_eq!(ranking[0]["total_interessados"], 2);
    assert_eq!(ranking[1]["id"], 2);
    // No interest left: highest price wins.
    assert_eq!(ranking[2]["id"], 5);
    assert_eq!(ranking[2]["total_interessados"], 0);
}

#[tokio::test]
async fn unknown_routes_answer_enveloped_404() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Endpoint GET /api/nope não encontrado");
}

async fn status_from(app: &Router, uri: &str, client_ip: &str) -> StatusCode {
    let request = Request::builder()
        .uri(uri)
        .header("x-forwarded-for", client_ip)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap().status()
}

#[tokio::test]
async fn rate_limit_refills_at_the_configured_rate_and_spares_health() {
    let config = Config {
        rate_limit: RateLimitConfig {
            per_second: 2,
            burst_size: 3,
        },
        ..Config::default()
    };
    let state = Arc::new(AppState::new(MemoryStore::seeded(), config));
    let app = build_router(state, true).unwrap();
    let client = "203.0.113.7";

    for _ in 0..3 {
        assert_eq!(status_from(&app, "/api/produtos", client).await, StatusCode::OK);
    }
    assert_eq!(
        status_from(&app, "/api/produtos", client).await,
        StatusCode::TOO_MANY_REQUESTS
    );

    // Other clients keep their own budget.
    assert_eq!(status_from(&app, "/api/produtos", "198.51.100.4").await, StatusCode::OK);

    // The health check is outside the limiter.
    for _ in 0..10 {
        assert_eq!(status_from(&app, "/api/health", client).await, StatusCode::OK);
    }

    // Two requests per second: one slot comes back after 500 ms.
    tokio::time::sleep(std::time::Duration::from_millis(650)).await;
    assert_eq!(status_from(&app, "/api/produtos", client).await, StatusCode::OK);
    assert_eq!(
        status_from(&app, "/api/produtos", client).await,
        StatusCode::TOO_MANY_REQUESTS
    );
}
