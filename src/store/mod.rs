//! Store abstraction the services are written against.
//!
//! Two implementations exist: [`PgStore`], backed by PostgreSQL tables and
//! stored functions, and [`MemoryStore`], an in-process stand-in used by the
//! mock server and the tests.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::future::Future;

use crate::errors::AppError;
use crate::models::{LeadSummary, NewLead, Product, RequestedProduct, StockOperation};

/// Persistent state behind the catalog, lead and statistics services.
///
/// Uses return-position `impl Trait` so no boxing is needed; every future
/// must be `Send` to run inside axum handlers.
pub trait Store: Send + Sync + 'static {
    /// Short backend name reported by the health endpoint.
    fn backend_name(&self) -> &'static str;

    /// Active products, `flagship_model` first, then by descending price.
    fn list_active_products(
        &self,
        flagship_model: &str,
    ) -> impl Future<Output = Result<Vec<Product>, AppError>> + Send;

    /// The product with `id`, only if it is active.
    fn find_active_product(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Product>, AppError>> + Send;

    /// Applies a stock adjustment atomically and returns the updated product,
    /// or `None` when no active product has `id`.
    fn adjust_stock(
        &self,
        id: i64,
        quantity: i32,
        operation: StockOperation,
    ) -> impl Future<Output = Result<Option<Product>, AppError>> + Send;

    /// Persists a lead and returns its generated id.
    fn register_lead(&self, lead: &NewLead) -> impl Future<Output = Result<i64, AppError>> + Send;

    /// Newest leads first, joined with their product.
    fn recent_leads(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<LeadSummary>, AppError>> + Send;

    fn count_active_products(&self) -> impl Future<Output = Result<i64, AppError>> + Send;

    fn count_products_in_stock(&self) -> impl Future<Output = Result<i64, AppError>> + Send;

    fn count_leads(&self) -> impl Future<Output = Result<i64, AppError>> + Send;

    /// Active products ranked by lead count, then by descending price.
    fn most_requested_products(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<RequestedProduct>, AppError>> + Send;

    /// Whether the backend is reachable. Never fails.
    fn check_health(&self) -> impl Future<Output = bool> + Send;

    /// Releases backend resources. Idempotent.
    fn close(&self) -> impl Future<Output = ()> + Send;
}
