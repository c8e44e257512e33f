use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

// Row and wire models keep the column names of the `produtos` and `contatos`
// tables, which are also the JSON contract consumed by the storefront.

/// Status value of products visible to clients.
pub const ACTIVE_STATUS: &str = "ativo";

/// Message stored when a lead submits none.
pub const DEFAULT_LEAD_MESSAGE: &str = "Contato via site TechBook";

/// Status tag of a freshly registered lead.
pub const NEW_LEAD_STATUS: &str = "novo";

/// Origin tag of leads captured by the website.
pub const WEBSITE_ORIGIN: &str = "site";

// ============ Database Models ============

/// A catalog product.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Product {
    pub id: i64,
    pub nome: String,
    /// Model code, e.g. `TBP-2025-I7`.
    pub modelo: String,
    pub descricao: Option<String>,
    #[serde(serialize_with = "decimal::serialize")]
    pub preco: BigDecimal,
    pub processador: Option<String>,
    pub placa_grafica: Option<String>,
    pub memoria_ram: Option<String>,
    pub armazenamento: Option<String>,
    pub tela_tamanho: Option<String>,
    pub tela_resolucao: Option<String>,
    pub tela_tipo: Option<String>,
    /// Weight in kilograms.
    #[serde(serialize_with = "decimal::serialize_option")]
    pub peso: Option<BigDecimal>,
    /// Thickness in millimetres.
    #[serde(serialize_with = "decimal::serialize_option")]
    pub espessura: Option<BigDecimal>,
    pub portas: Option<String>,
    pub wireless: Option<String>,
    pub estoque: i32,
    pub status: String,
    pub data_cadastro: DateTime<Utc>,
    pub data_atualizacao: DateTime<Utc>,
}

impl Product {
    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }
}

/// A stored lead, as kept by the in-memory store.
#[derive(Debug, Clone, Serialize)]
pub struct Lead {
    pub id: i64,
    pub nome: String,
    pub email: String,
    pub telefone: Option<String>,
    pub mensagem: String,
    pub produto_interesse_id: Option<i64>,
    pub status_contato: String,
    pub origem: String,
    pub ip_address: String,
    pub user_agent: String,
    pub data_primeiro_contato: DateTime<Utc>,
}

/// Lead listing row, joined with the product it refers to.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct LeadSummary {
    pub id: i64,
    pub nome: String,
    pub email: String,
    pub telefone: Option<String>,
    pub mensagem: Option<String>,
    pub status_contato: String,
    pub origem: String,
    pub data_primeiro_contato: DateTime<Utc>,
    pub produto_interesse_nome: Option<String>,
    pub produto_interesse_modelo: Option<String>,
    #[serde(serialize_with = "decimal::serialize_option")]
    pub produto_interesse_preco: Option<BigDecimal>,
}

/// An active product with the number of leads interested in it.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct RequestedProduct {
    pub id: i64,
    pub nome: String,
    pub modelo: String,
    #[serde(serialize_with = "decimal::serialize")]
    pub preco: BigDecimal,
    pub total_interessados: i64,
}

/// Aggregate catalog and lead counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_produtos: i64,
    pub produtos_em_estoque: i64,
    pub total_interessados: i64,
    pub produtos_mais_procurados: Vec<RequestedProduct>,
}

/// `SELECT COUNT(*) AS total` result.
#[derive(Debug, FromRow)]
pub struct CountRow {
    pub total: i64,
}

/// `registrar_contato` result.
#[derive(Debug, FromRow)]
pub struct RegisteredLeadRow {
    pub contato_id: i64,
}

// ============ Domain Inputs ============

/// A validated lead, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub product_id: Option<i64>,
    pub origin: RequestOrigin,
}

/// Request metadata captured with each lead for auditing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub ip_address: String,
    pub user_agent: String,
}

impl RequestOrigin {
    pub const UNKNOWN: &'static str = "N/A";

    pub fn unknown() -> Self {
        Self {
            ip_address: Self::UNKNOWN.to_string(),
            user_agent: Self::UNKNOWN.to_string(),
        }
    }
}

/// Direction of a stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockOperation {
    #[serde(rename = "adicionar")]
    Add,
    #[serde(rename = "remover")]
    Remove,
}

impl StockOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockOperation::Add => "adicionar",
            StockOperation::Remove => "remover",
        }
    }
}

impl fmt::Display for StockOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adicionar" => Ok(StockOperation::Add),
            "remover" => Ok(StockOperation::Remove),
            other => Err(format!("unknown stock operation: {}", other)),
        }
    }
}

// ============ API Request Models ============

/// Body of `POST /api/contatos`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactRequest {
    pub nome: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mensagem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produto_id: Option<i64>,
}

/// Body of `PUT /api/produtos/:id/estoque`.
///
/// `quantidade` is kept loose because the storefront may send it as a string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockAdjustmentRequest {
    pub quantidade: Option<serde_json::Value>,
    pub operacao: Option<String>,
}

/// Serializes decimals as JSON numbers, which is what the storefront formats.
mod decimal {
    use bigdecimal::{BigDecimal, ToPrimitive};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
        match value.to_f64() {
            Some(number) => serializer.serialize_f64(number),
            None => serializer.serialize_str(&value.to_string()),
        }
    }

    pub fn serialize_option<S: Serializer>(
        value: &Option<BigDecimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }
}
