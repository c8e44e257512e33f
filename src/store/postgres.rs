use crate::db::{Database, SqlParam};
use crate::errors::AppError;
use crate::models::{
    CountRow, LeadSummary, NewLead, Product, RegisteredLeadRow, RequestedProduct, StockOperation,
};
use crate::store::Store;

const PRODUCT_COLUMNS: &str = "id, nome, modelo, descricao, preco, \
     processador, placa_grafica, memoria_ram, armazenamento, \
     tela_tamanho, tela_resolucao, tela_tipo, peso, espessura, \
     portas, wireless, estoque, status, data_cadastro, data_atualizacao";

/// Store backed by the `produtos`/`contatos` tables and the stored functions
/// defined in `sql/schema.sql`.
pub struct PgStore {
    db: Database,
}

impl PgStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn count(&self, sql: &str) -> Result<i64, AppError> {
        let rows: Vec<CountRow> = self.db.fetch_all(sql, &[]).await?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

impl Store for PgStore {
    fn backend_name(&self) -> &'static str {
        "PostgreSQL"
    }

    async fn list_active_products(&self, flagship_model: &str) -> Result<Vec<Product>, AppError> {
        let sql = format!(
            "SELECT {} FROM produtos \
             WHERE status = 'ativo' \
             ORDER BY CASE WHEN modelo = $1 THEN 0 ELSE 1 END, preco DESC, id ASC",
            PRODUCT_COLUMNS
        );
        self.db.fetch_all(&sql, &[flagship_model.into()]).await
    }

    async fn find_active_product(&self, id: i64) -> Result<Option<Product>, AppError> {
        let sql = format!(
            "SELECT {} FROM produtos WHERE id = $1 AND status = 'ativo'",
            PRODUCT_COLUMNS
        );
        let rows: Vec<Product> = self.db.fetch_all(&sql, &[id.into()]).await?;
        Ok(rows.into_iter().next())
    }

    async fn adjust_stock(
        &self,
        id: i64,
        quantity: i32,
        operation: StockOperation,
    ) -> Result<Option<Product>, AppError> {
        let rows: Vec<Product> = self
            .db
            .call_procedure(
                "atualizar_estoque",
                &[id.into(), quantity.into(), operation.as_str().into()],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn register_lead(&self, lead: &NewLead) -> Result<i64, AppError> {
        let rows: Vec<RegisteredLeadRow> = self
            .db
            .call_procedure(
                "registrar_contato",
                &[
                    lead.name.as_str().into(),
                    lead.email.as_str().into(),
                    lead.phone.clone().into(),
                    lead.message.as_str().into(),
                    lead.product_id.into(),
                    lead.origin.ip_address.as_str().into(),
                    lead.origin.user_agent.as_str().into(),
                ],
            )
            .await?;

        rows.first().map(|r| r.contato_id).ok_or_else(|| {
            AppError::InternalError("registrar_contato returned no identifier".to_string())
        })
    }

    async fn recent_leads(&self, limit: i64) -> Result<Vec<LeadSummary>, AppError> {
        self.db
            .fetch_all(
                "SELECT c.id, c.nome, c.email, c.telefone, c.mensagem, \
                        c.status_contato, c.origem, c.data_primeiro_contato, \
                        p.nome AS produto_interesse_nome, \
                        p.modelo AS produto_interesse_modelo, \
                        p.preco AS produto_interesse_preco \
                 FROM contatos c \
                 LEFT JOIN produtos p ON c.produto_interesse_id = p.id \
                 ORDER BY c.data_primeiro_contato DESC, c.id DESC \
                 LIMIT $1",
                &[limit.into()],
            )
            .await
    }

    async fn count_active_products(&self) -> Result<i64, AppError> {
        self.count("SELECT COUNT(*) AS total FROM produtos WHERE status = 'ativo'")
            .await
    }

    async fn count_products_in_stock(&self) -> Result<i64, AppError> {
        self.count(
            "SELECT COUNT(*) AS total FROM produtos WHERE status = 'ativo' AND estoque > 0",
        )
        .await
    }

    async fn count_leads(&self) -> Result<i64, AppError> {
        self.count("SELECT COUNT(*) AS total FROM contatos").await
    }

    async fn most_requested_products(&self, limit: i64) -> Result<Vec<RequestedProduct>, AppError> {
        self.db
            .fetch_all(
                "SELECT p.id, p.nome, p.modelo, p.preco, \
                        COUNT(c.id) AS total_interessados \
                 FROM produtos p \
                 LEFT JOIN contatos c ON p.id = c.produto_interesse_id \
                 WHERE p.status = 'ativo' \
                 GROUP BY p.id, p.nome, p.modelo, p.preco \
                 ORDER BY total_interessados DESC, p.preco DESC, p.id ASC \
                 LIMIT $1",
                &[SqlParam::BigInt(Some(limit))],
            )
            .await
    }

    async fn check_health(&self) -> bool {
        self.db.check_health().await
    }

    async fn close(&self) {
        self.db.close().await
    }
}
