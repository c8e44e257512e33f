use bigdecimal::BigDecimal;
use chrono::Utc;
use std::cmp::Ordering;
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::{
    Lead, LeadSummary, NewLead, Product, RequestedProduct, StockOperation, ACTIVE_STATUS,
    NEW_LEAD_STATUS, WEBSITE_ORIGIN,
};
use crate::store::Store;

/// In-process store. Ids are assigned in insertion order and nothing
/// survives a restart.
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    products: Vec<Product>,
    leads: Vec<Lead>,
    next_lead_id: i64,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::with_products(Vec::new())
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                products,
                leads: Vec::new(),
                next_lead_id: 1,
            }),
        }
    }

    /// Store preloaded with the TechBook demo catalog.
    pub fn seeded() -> Self {
        Self::with_products(demo_catalog())
    }

    /// All leads currently held, oldest first.
    pub async fn leads(&self) -> Vec<Lead> {
        self.state.read().await.leads.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Flagship first, then by descending price, then by ascending id.
fn catalog_order(flagship_model: &str, a: &Product, b: &Product) -> Ordering {
    let rank = |p: &Product| if p.modelo == flagship_model { 0 } else { 1 };
    rank(a)
        .cmp(&rank(b))
        .then_with(|| b.preco.cmp(&a.preco))
        .then_with(|| a.id.cmp(&b.id))
}

impl Store for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "in-memory"
    }

    async fn list_active_products(&self, flagship_model: &str) -> Result<Vec<Product>, AppError> {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state
            .products
            .iter()
            .filter(|p| p.is_active())
            .cloned()
            .collect();
        products.sort_by(|a, b| catalog_order(flagship_model, a, b));
        Ok(products)
    }

    async fn find_active_product(&self, id: i64) -> Result<Option<Product>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .products
            .iter()
            .find(|p| p.id == id && p.is_active())
            .cloned())
    }

    async fn adjust_stock(
        &self,
        id: i64,
        quantity: i32,
        operation: StockOperation,
    ) -> Result<Option<Product>, AppError> {
        let mut state = self.state.write().await;
        let Some(product) = state
            .products
            .iter_mut()
            .find(|p| p.id == id && p.is_active())
        else {
            return Ok(None);
        };

        let updated = match operation {
            StockOperation::Add => product.estoque.checked_add(quantity),
            StockOperation::Remove => product
                .estoque
                .checked_sub(quantity)
                .filter(|stock| *stock >= 0),
        };

        let Some(stock) = updated else {
            return Err(AppError::BadRequest("Estoque insuficiente".to_string()));
        };

        product.estoque = stock;
        product.data_atualizacao = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn register_lead(&self, lead: &NewLead) -> Result<i64, AppError> {
        let mut state = self.state.write().await;

        if let Some(product_id) = lead.product_id {
            if !state
                .products
                .iter()
                .any(|p| p.id == product_id && p.is_active())
            {
                return Err(AppError::BadRequest(
                    "Produto não encontrado ou inativo".to_string(),
                ));
            }
        }

        let id = state.next_lead_id;
        state.next_lead_id += 1;
        state.leads.push(Lead {
            id,
            nome: lead.name.clone(),
            email: lead.email.clone(),
            telefone: lead.phone.clone(),
            mensagem: lead.message.clone(),
            produto_interesse_id: lead.product_id,
            status_contato: NEW_LEAD_STATUS.to_string(),
            origem: WEBSITE_ORIGIN.to_string(),
            ip_address: lead.origin.ip_address.clone(),
            user_agent: lead.origin.user_agent.clone(),
            data_primeiro_contato: Utc::now(),
        });

        Ok(id)
    }

    async fn recent_leads(&self, limit: i64) -> Result<Vec<LeadSummary>, AppError> {
        let state = self.state.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);

        // Later ids were registered later, so reversing insertion order is newest first.
        Ok(state
            .leads
            .iter()
            .rev()
            .take(limit)
            .map(|lead| {
                let product = lead
                    .produto_interesse_id
                    .and_then(|id| state.products.iter().find(|p| p.id == id));
                LeadSummary {
                    id: lead.id,
                    nome: lead.nome.clone(),
                    email: lead.email.clone(),
                    telefone: lead.telefone.clone(),
                    mensagem: Some(lead.mensagem.clone()),
                    status_contato: lead.status_contato.clone(),
                    origem: lead.origem.clone(),
                    data_primeiro_contato: lead.data_primeiro_contato,
                    produto_interesse_nome: product.map(|p| p.nome.clone()),
                    produto_interesse_modelo: product.map(|p| p.modelo.clone()),
                    produto_interesse_preco: product.map(|p| p.preco.clone()),
                }
            })
            .collect())
    }

    async fn count_active_products(&self) -> Result<i64, AppError> {
        let state = self.state.read().await;
        Ok(state.products.iter().filter(|p| p.is_active()).count() as i64)
    }

    async fn count_products_in_stock(&self) -> Result<i64, AppError> {
        let state = self.state.read().await;
        Ok(state
            .products
            .iter()
            .filter(|p| p.is_active() && p.estoque > 0)
            .count() as i64)
    }

    async fn count_leads(&self) -> Result<i64, AppError> {
        Ok(self.state.read().await.leads.len() as i64)
    }

    async fn most_requested_products(&self, limit: i64) -> Result<Vec<RequestedProduct>, AppError> {
        let state = self.state.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);

        let mut ranked: Vec<RequestedProduct> = state
            .products
            .iter()
            .filter(|p| p.is_active())
            .map(|p| RequestedProduct {
                id: p.id,
                nome: p.nome.clone(),
                modelo: p.modelo.clone(),
                preco: p.preco.clone(),
                total_interessados: state
                    .leads
                    .iter()
                    .filter(|l| l.produto_interesse_id == Some(p.id))
                    .count() as i64,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.total_interessados
                .cmp(&a.total_interessados)
                .then_with(|| b.preco.cmp(&a.preco))
                .then_with(|| a.id.cmp(&b.id))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn check_health(&self) -> bool {
        true
    }

    async fn close(&self) {
        tracing::debug!("In-memory store closed");
    }
}

fn decimal(units: i64, scale: i64) -> BigDecimal {
    BigDecimal::new(units.into(), scale)
}

#[allow(clippy::too_many_arguments)]
fn demo_product(
    id: i64,
    nome: &str,
    modelo: &str,
    descricao: &str,
    preco: i64,
    specs: [&str; 8],
    peso_decigrams: i64,
    espessura_tenths: i64,
    wireless: &str,
    estoque: i32,
) -> Product {
    let [processador, placa_grafica, memoria_ram, armazenamento, tela_tamanho, tela_resolucao, tela_tipo, portas] =
        specs;
    let now = Utc::now();
    Product {
        id,
        nome: nome.to_string(),
        modelo: modelo.to_string(),
        descricao: Some(descricao.to_string()),
        preco: decimal(preco * 100, 2),
        processador: Some(processador.to_string()),
        placa_grafica: Some(placa_grafica.to_string()),
        memoria_ram: Some(memoria_ram.to_string()),
        armazenamento: Some(armazenamento.to_string()),
        tela_tamanho: Some(tela_tamanho.to_string()),
        tela_resolucao: Some(tela_resolucao.to_string()),
        tela_tipo: Some(tela_tipo.to_string()),
        peso: Some(decimal(peso_decigrams, 1)),
        espessura: Some(decimal(espessura_tenths, 1)),
        portas: Some(portas.to_string()),
        wireless: Some(wireless.to_string()),
        estoque,
        status: ACTIVE_STATUS.to_string(),
        data_cadastro: now,
        data_atualizacao: now,
    }
}

/// The five TechBook models the storefront was designed around.
pub fn demo_catalog() -> Vec<Product> {
    vec![
        demo_product(
            1,
            "TechBook Pro",
            "TBP-2025-I7",
            "O notebook que redefine os padrões de performance, design e inovação. Projetado para profissionais que não aceitam limitações.",
            4999,
            [
                "Intel Core i7-12700H (14 cores, 20 threads)",
                "NVIDIA GeForce RTX 4060 8GB GDDR6",
                "32GB DDR5-4800MHz (2x16GB)",
                "SSD NVMe M.2 1TB PCIe 4.0",
                "15.6\"",
                "3840x2160",
                "4K OLED",
                "2x USB-C Thunderbolt 4, 2x USB 3.2, HDMI 2.1",
            ],
            18,
            189,
            "Wi-Fi 6E, Bluetooth 5.3",
            25,
        ),
        demo_product(
            2,
            "TechBook Air",
            "TBA-2025-I5",
            "Notebook ultraleve para produtividade e mobilidade. Ideal para trabalho e estudos.",
            2999,
            [
                "Intel Core i5-12500H (12 cores, 16 threads)",
                "Intel Iris Xe Graphics",
                "16GB DDR5-4800MHz (2x8GB)",
                "SSD NVMe M.2 512GB PCIe 4.0",
                "14\"",
                "1920x1080",
                "IPS",
                "2x USB-C Thunderbolt 4, 1x USB 3.2, HDMI 2.1",
            ],
            12,
            148,
            "Wi-Fi 6E, Bluetooth 5.3",
            40,
        ),
        demo_product(
            3,
            "TechBook Gaming",
            "TBG-2025-I9",
            "Notebook gamer de alta performance para jogos e criação de conteúdo profissional.",
            7999,
            [
                "Intel Core i9-12900H (16 cores, 24 threads)",
                "NVIDIA GeForce RTX 4070 12GB GDDR6",
                "64GB DDR5-5200MHz (2x32GB)",
                "SSD NVMe M.2 2TB PCIe 4.0",
                "17.3\"",
                "2560x1440",
                "QHD IPS 165Hz",
                "3x USB-C Thunderbolt 4, 2x USB 3.2, HDMI 2.1, RJ45",
            ],
            28,
            225,
            "Wi-Fi 6E, Bluetooth 5.3",
            15,
        ),
        demo_product(
            4,
            "TechBook Student",
            "TBS-2025-I3",
            "Notebook acessível para estudantes e uso básico do dia a dia.",
            1899,
            [
                "Intel Core i3-12100U (4 cores, 8 threads)",
                "Intel UHD Graphics",
                "8GB DDR4-3200MHz (1x8GB)",
                "SSD NVMe M.2 256GB PCIe 3.0",
                "15.6\"",
                "1366x768",
                "TN",
                "1x USB-C, 2x USB 3.0, HDMI 1.4",
            ],
            21,
            198,
            "Wi-Fi 5, Bluetooth 4.2",
            3,
        ),
        demo_product(
            5,
            "TechBook Workstation",
            "TBW-2025-I9",
            "Estação de trabalho móvel para profissionais de engenharia e design.",
            12999,
            [
                "Intel Core i9-12950HX (16 cores, 24 threads)",
                "NVIDIA RTX A4000 16GB",
                "128GB DDR5-5600MHz (4x32GB)",
                "SSD NVMe M.2 4TB PCIe 4.0",
                "17\"",
                "3840x2400",
                "4K IPS",
                "4x USB-C Thunderbolt 4, 2x USB 3.2, HDMI 2.1, RJ45, SD Card",
            ],
            32,
            254,
            "Wi-Fi 6E, Bluetooth 5.3",
            0,
        ),
    ]
}
