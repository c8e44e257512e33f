//! Exercises a running TechBook API end to end: health, catalog listing,
//! product lookup and statistics. Read-only unless `SMOKE_SUBMIT_CONTACT=1`.
//!
//! The target defaults to `http://localhost:3000`; override with `API_BASE_URL`.

use dotenvy::dotenv;
use std::env;
use techbook_api::api_client::TechBookClient;
use techbook_api::models::ContactRequest;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let base_url = env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".into());
    let client = TechBookClient::new(base_url.clone())?;

    println!("Checking {}", base_url);

    let health = client.health().await?;
    println!(
        "- health: {} ({})",
        health.status.as_deref().unwrap_or("?"),
        health.database.as_deref().unwrap_or("?")
    );

    let products = client.products().await?;
    let items = products.data.unwrap_or_default();
    println!("- produtos: {} active", items.len());
    for item in &items {
        println!(
            "  - #{} {} [{}] R$ {:.2} (estoque {})",
            item.id, item.nome, item.modelo, item.preco, item.estoque
        );
    }

    if let Some(first) = items.first() {
        let product = client.product(first.id).await?;
        anyhow::ensure!(
            product.data.as_ref().map(|p| p.id) == Some(first.id),
            "product lookup returned a different product"
        );
        println!("- produto {}: ok", first.id);
    }

    if env::var("SMOKE_SUBMIT_CONTACT").as_deref() == Ok("1") {
        let contact = ContactRequest {
            nome: Some("Smoke Check".into()),
            email: Some("smoke@techbook.com.br".into()),
            mensagem: Some("Verificação automática".into()),
            produto_id: items.first().map(|p| p.id),
            ..Default::default()
        };
        let id = client.submit_contact(&contact).await?;
        println!("- contato registrado: {}", id);
    }

    let stats = client.statistics().await?;
    if let Some(stats) = stats.data {
        println!(
            "- estatísticas: {} produtos, {} em estoque, {} interessados",
            stats.total_produtos, stats.produtos_em_estoque, stats.total_interessados
        );
    }

    println!("All checks passed");
    Ok(())
}
