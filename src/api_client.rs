use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::AppError;
use crate::models::{ContactRequest, StockAdjustmentRequest, StockOperation};
use crate::response::Envelope;

/// Product as seen by API consumers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub nome: String,
    pub modelo: String,
    pub preco: f64,
    pub estoque: i32,
    pub status: String,
}

/// Entry of the statistics ranking.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RankedItem {
    pub id: i64,
    pub nome: String,
    pub modelo: String,
    pub preco: f64,
    pub total_interessados: i64,
}

/// Payload of `GET /api/estatisticas`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogStatistics {
    pub total_produtos: i64,
    pub produtos_em_estoque: i64,
    pub total_interessados: i64,
    pub produtos_mais_procurados: Vec<RankedItem>,
}

/// Client for a running TechBook API instance.
///
/// Every call returns the decoded envelope. Non-2xx answers become
/// [`AppError::ExternalApiError`] carrying the server's `message`.
#[derive(Clone)]
pub struct TechBookClient {
    client: reqwest::Client,
    base_url: String,
}

impl TechBookClient {
    /// Creates a new `TechBookClient` with a 30 second request timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Scheme, host and port of the API, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create TechBook client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn health(&self) -> Result<Envelope, AppError> {
        self.send::<(), ()>(Method::GET, "/api/health", None).await
    }

    pub async fn products(&self) -> Result<Envelope<Vec<CatalogItem>>, AppError> {
        self.send::<(), _>(Method::GET, "/api/produtos", None).await
    }

    pub async fn product(&self, id: i64) -> Result<Envelope<CatalogItem>, AppError> {
        self.send::<(), _>(Method::GET, &format!("/api/produtos/{}", id), None)
            .await
    }

    pub async fn statistics(&self) -> Result<Envelope<CatalogStatistics>, AppError> {
        self.send::<(), _>(Method::GET, "/api/estatisticas", None).await
    }

    /// Registers a lead and returns the id the server assigned to it.
    pub async fn submit_contact(&self, contact: &ContactRequest) -> Result<i64, AppError> {
        tracing::info!(
            "Submitting contact {}",
            contact.email.as_deref().unwrap_or_default()
        );
        let envelope: Envelope = self
            .send(Method::POST, "/api/contatos", Some(contact))
            .await?;

        envelope.contato_id.ok_or_else(|| {
            AppError::ExternalApiError("Contact response missing 'contato_id' field".to_string())
        })
    }

    pub async fn adjust_stock(
        &self,
        id: i64,
        quantity: i64,
        operation: StockOperation,
    ) -> Result<Envelope<CatalogItem>, AppError> {
        let body = StockAdjustmentRequest {
            quantidade: Some(quantity.into()),
            operacao: Some(operation.to_string()),
        };
        self.send(
            Method::PUT,
            &format!("/api/produtos/{}/estoque", id),
            Some(&body),
        )
        .await
    }

    async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Envelope<T>, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalApiError(
                failure_message(status, response).await,
            ));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse response from {}: {}", url, e))
        })
    }
}

async fn failure_message(status: StatusCode, response: reqwest::Response) -> String {
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    // Prefer the envelope's message; fall back to the raw body.
    let message = serde_json::from_str::<Envelope<serde_json::Value>>(&text)
        .ok()
        .and_then(|envelope| envelope.message)
        .unwrap_or(text);

    format!("TechBook API returned {}: {}", status, message)
}
