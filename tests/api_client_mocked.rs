/// Client tests against a mocked TechBook API
/// Verifies request shapes and envelope decoding without a running server
use serde_json::json;
use techbook_api::api_client::TechBookClient;
use techbook_api::errors::AppError;
use techbook_api::models::{ContactRequest, StockOperation};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMESTAMP: &str = "2025-01-15T12:00:00Z";

#[tokio::test]
async fn test_products_are_decoded_from_the_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/produtos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"id": 1, "nome": "TechBook Pro", "modelo": "TBP-2025-I7", "preco": 4999.0,
                 "estoque": 25, "status": "ativo", "descricao": "ignored"},
                {"id": 5, "nome": "TechBook Workstation", "modelo": "TBW-2025-I9", "preco": 12999.0,
                 "estoque": 0, "status": "ativo"}
            ],
            "total": 2,
            "timestamp": TIMESTAMP
        })))
        .mount(&mock_server)
        .await;

    let client = TechBookClient::new(mock_server.uri()).unwrap();
    let envelope = client.products().await.unwrap();

    assert!(envelope.success);
    assert_eq!(envelope.total, Some(2));
    let items = envelope.data.unwrap();
    assert_eq!(items[0].modelo, "TBP-2025-I7");
    assert_eq!(items[1].estoque, 0);
}

#[tokio::test]
async fn test_health_reads_status_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "status": "disconnected",
            "database": "PostgreSQL",
            "timestamp": TIMESTAMP
        })))
        .mount(&mock_server)
        .await;

    let client = TechBookClient::new(mock_server.uri()).unwrap();
    let health = client.health().await.unwrap();

    assert_eq!(health.status.as_deref(), Some("disconnected"));
    assert_eq!(health.database.as_deref(), Some("PostgreSQL"));
}

#[tokio::test]
async fn test_submit_contact_posts_the_form_and_returns_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/contatos"))
        .and(body_json(json!({
            "nome": "Ana",
            "email": "ana@x.com",
            "produto_id": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Contato registrado com sucesso",
            "contato_id": 42,
            "timestamp": TIMESTAMP
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = TechBookClient::new(mock_server.uri()).unwrap();
    let contact = ContactRequest {
        nome: Some("Ana".into()),
        email: Some("ana@x.com".into()),
        produto_id: Some(1),
        ..Default::default()
    };

    assert_eq!(client.submit_contact(&contact).await.unwrap(), 42);
}

#[tokio::test]
async fn test_adjust_stock_sends_operation_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/produtos/1/estoque"))
        .and(body_json(json!({"quantidade": 5, "operacao": "remover"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Estoque atualizado com sucesso",
            "data": {"id": 1, "nome": "TechBook Pro", "modelo": "TBP-2025-I7",
                     "preco": 4999.0, "estoque": 20, "status": "ativo"},
            "timestamp": TIMESTAMP
        })))
        .mount(&mock_server)
        .await;

    let client = TechBookClient::new(mock_server.uri()).unwrap();
    let envelope = client
        .adjust_stock(1, 5, StockOperation::Remove)
        .await
        .unwrap();

    assert_eq!(envelope.data.unwrap().estoque, 20);
}

#[tokio::test]
async fn test_error_envelope_message_is_surfaced() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/produtos/999999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "message": "Produto não encontrado ou inativo",
            "timestamp": TIMESTAMP
        })))
        .mount(&mock_server)
        .await;

    let client = TechBookClient::new(mock_server.uri()).unwrap();
    let err = client.product(999999).await.unwrap_err();

    match err {
        AppError::ExternalApiError(msg) => {
            assert!(msg.contains("404"));
            assert!(msg.contains("Produto não encontrado ou inativo"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_missing_contact_id_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/contatos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "timestamp": TIMESTAMP
        })))
        .mount(&mock_server)
        .await;

    let client = TechBookClient::new(mock_server.uri()).unwrap();
    let contact = ContactRequest {
        nome: Some("Ana".into()),
        email: Some("ana@x.com".into()),
        ..Default::default()
    };

    assert!(matches!(
        client.submit_contact(&contact).await,
        Err(AppError::ExternalApiError(_))
    ));
}
