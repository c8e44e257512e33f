//! Catalog, lead and statistics services.
//!
//! Services validate input and apply business rules; persistence goes through
//! the injected [`Store`]. They are cheap to build, so handlers create one per
//! request.

use crate::errors::AppError;
use crate::models::{
    LeadSummary, NewLead, Product, RequestOrigin, Statistics, StockOperation,
    DEFAULT_LEAD_MESSAGE,
};
use crate::store::Store;

pub const PRODUCT_NOT_FOUND: &str = "Produto não encontrado ou inativo";
pub const INVALID_STOCK_OPERATION: &str = "Operação deve ser \"adicionar\" ou \"remover\"";
pub const INVALID_QUANTITY: &str = "Quantidade deve ser um número inteiro não negativo";
pub const MISSING_NAME_OR_EMAIL: &str = "Nome e email são obrigatórios";

/// Maximum number of leads returned by a listing.
pub const MAX_RECENT_LEADS: i64 = 50;

/// Size of the "most requested products" ranking.
pub const TOP_PRODUCTS: i64 = 3;

// ============ Catalog ============

/// Read access to active products plus stock adjustment.
pub struct CatalogService<'a, S: Store> {
    store: &'a S,
    flagship_model: &'a str,
}

impl<'a, S: Store> CatalogService<'a, S> {
    pub fn new(store: &'a S, flagship_model: &'a str) -> Self {
        Self {
            store,
            flagship_model,
        }
    }

    /// Active products, flagship first, then by descending price.
    pub async fn list_active(&self) -> Result<Vec<Product>, AppError> {
        self.store.list_active_products(self.flagship_model).await
    }

    /// The active product with `id`, or `NotFound`.
    pub async fn get_by_id(&self, id: i64) -> Result<Product, AppError> {
        self.store
            .find_active_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))
    }

    /// Adjusts the stock of an active product.
    ///
    /// `operation` must be `adicionar` or `remover` and `quantity` must be a
    /// non-negative integer that fits a stock count; both are checked, in
    /// that order, before the store is called.
    pub async fn adjust_stock(
        &self,
        id: i64,
        quantity: Option<i64>,
        operation: &str,
    ) -> Result<Product, AppError> {
        let operation: StockOperation = operation
            .parse()
            .map_err(|_| AppError::BadRequest(INVALID_STOCK_OPERATION.to_string()))?;

        let quantity = quantity
            .and_then(|q| i32::try_from(q).ok())
            .filter(|q| *q >= 0)
            .ok_or_else(|| AppError::BadRequest(INVALID_QUANTITY.to_string()))?;

        tracing::info!(
            "Adjusting stock of product {}: {} {}",
            id,
            operation,
            quantity
        );

        let product = self
            .store
            .adjust_stock(id, quantity, operation)
            .await?
            .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;

        tracing::info!("Product {} stock is now {}", product.id, product.estoque);
        Ok(product)
    }
}

// ============ Leads ============

/// A contact form submission as received from the client.
#[derive(Debug, Clone, Default)]
pub struct LeadSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub product_id: Option<i64>,
}

/// Validates and records contact submissions.
pub struct LeadService<'a, S: Store> {
    store: &'a S,
    flagship_model: &'a str,
}

impl<'a, S: Store> LeadService<'a, S> {
    pub fn new(store: &'a S, flagship_model: &'a str) -> Self {
        Self {
            store,
            flagship_model,
        }
    }

    /// Registers a lead and returns the id generated by the store.
    ///
    /// Validation happens before any write: name and email are required, and
    /// a referenced product must be active.
    pub async fn submit(
        &self,
        submission: LeadSubmission,
        origin: RequestOrigin,
    ) -> Result<i64, AppError> {
        let (name, email) = match (
            non_blank(submission.name),
            non_blank(submission.email),
        ) {
            (Some(name), Some(email)) => (name, email),
            _ => return Err(AppError::BadRequest(MISSING_NAME_OR_EMAIL.to_string())),
        };

        // The storefront sends 0 when no product is selected.
        let product_id = submission.product_id.filter(|id| *id != 0);

        if let Some(id) = product_id {
            let catalog = CatalogService::new(self.store, self.flagship_model);
            match catalog.get_by_id(id).await {
                Ok(product) => tracing::debug!("Lead refers to product {}", product.nome),
                Err(AppError::NotFound(_)) => {
                    return Err(AppError::BadRequest(PRODUCT_NOT_FOUND.to_string()))
                }
                Err(e) => return Err(e),
            }
        }

        let lead = NewLead {
            name,
            email,
            phone: non_blank(submission.phone),
            message: non_blank(submission.message)
                .unwrap_or_else(|| DEFAULT_LEAD_MESSAGE.to_string()),
            product_id,
            origin,
        };

        tracing::info!("Registering lead: {} - {}", lead.name, lead.email);
        let id = self.store.register_lead(&lead).await?;
        tracing::info!("Lead registered with id {}", id);

        Ok(id)
    }

    /// Newest leads first, at most [`MAX_RECENT_LEADS`].
    pub async fn list_recent(&self, limit: Option<i64>) -> Result<Vec<LeadSummary>, AppError> {
        let limit = limit.unwrap_or(MAX_RECENT_LEADS).clamp(0, MAX_RECENT_LEADS);
        self.store.recent_leads(limit).await
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============ Health ============

/// Store connectivity as reported by `/api/health`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub connected: bool,
    pub backend: &'static str,
}

impl HealthReport {
    pub fn status(&self) -> &'static str {
        if self.connected {
            "connected"
        } else {
            "disconnected"
        }
    }
}

pub struct HealthService<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> HealthService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Never fails; an unreachable store reads as disconnected.
    pub async fn check(&self) -> HealthReport {
        let report = HealthReport {
            connected: self.store.check_health().await,
            backend: self.store.backend_name(),
        };
        tracing::debug!("Health check: {} ({})", report.status(), report.backend);
        report
    }
}

// ============ Statistics ============

/// Aggregate counts over the catalog and the leads.
pub struct StatisticsService<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> StatisticsService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn compute(&self) -> Result<Statistics, AppError> {
        let stats = Statistics {
            total_produtos: self.store.count_active_products().await?,
            produtos_em_estoque: self.store.count_products_in_stock().await?,
            total_interessados: self.store.count_leads().await?,
            produtos_mais_procurados: self.store.most_requested_products(TOP_PRODUCTS).await?,
        };

        tracing::debug!(
            "Statistics: {} products, {} in stock, {} leads",
            stats.total_produtos,
            stats.produtos_em_estoque,
            stats.total_interessados
        );

        Ok(stats)
    }
}
