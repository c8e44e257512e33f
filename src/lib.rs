//! TechBook catalog and lead-capture API.
//!
//! # Modules
//!
//! - `app`: Router assembly and HTTP middleware.
//! - `api_client`: Typed HTTP client for a running instance.
//! - `config`: Configuration management.
//! - `db`: PostgreSQL pool and query helpers.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Row, domain and request models.
//! - `response`: The JSON envelope every endpoint answers with.
//! - `server`: Tracing setup and the serve loop.
//! - `services`: Catalog, lead and statistics rules.
//! - `store`: Store trait with PostgreSQL and in-memory backends.

pub mod api_client;
pub mod app;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod response;
pub mod server;
pub mod services;
pub mod store;
