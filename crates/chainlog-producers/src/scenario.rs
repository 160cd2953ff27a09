//! A scripted walkthrough over the sample data.
//!
//! Exercises every transaction type at least once so a fresh ledger ends
//! up with a representative chain to list, verify, and summarize.

use tracing::info;

use crate::catalog::{Catalog, CatalogResult};
use crate::mock_data::{sample_companies, sample_prices, sample_products, sample_users};
use crate::model::{CompanyUpdate, ProductUpdate};

/// What the walkthrough did, one line per use case.
#[derive(Debug, Default)]
pub struct DemoOutcome {
    pub steps: Vec<String>,
}

impl DemoOutcome {
    fn step(&mut self, line: String) {
        info!(step = %line, "demo");
        self.steps.push(line);
    }
}

/// Run the walkthrough as `actor`.  Stops at the first failing use case.
pub fn run_demo(catalog: &Catalog, actor: &str) -> CatalogResult<DemoOutcome> {
    let mut out = DemoOutcome::default();

    for company in sample_companies() {
        let created = catalog.create_company(company, actor)?;
        out.step(format!("created company {} ({})", created.nombre, created.nit));
    }

    let mut first_product = None;
    for new in sample_products() {
        let product = catalog.create_product(new, actor)?;
        out.step(format!("created product {} ({})", product.nombre, product.codigo));
        first_product.get_or_insert(product.id);
    }

    let products = catalog.products()?;
    for (codigo, currency, price) in sample_prices() {
        if let Some(product) = products.iter().find(|p| p.codigo == codigo) {
            catalog.set_price(product.id, currency, price, actor)?;
            out.step(format!("priced {} at {} {}", codigo, price, currency));
        }
    }

    let stock = catalog.create_inventory("800987654", "P-001", 40, "Bodega 1", actor)?;
    out.step(format!("opened stock #{} with {} units", stock.id, stock.cantidad));
    let stock = catalog.remove_stock(stock.id, 15, actor)?;
    out.step(format!("sold 15 units, {} left", stock.cantidad));
    let spare = catalog.create_inventory("900123456", "A-100", 3, "Patio", actor)?;
    out.step(format!("opened stock #{} with {} units", spare.id, spare.cantidad));

    catalog.update_company(
        "900123456",
        CompanyUpdate {
            telefono: Some("+57 601 555 0102".to_string()),
            ..Default::default()
        },
        actor,
    )?;
    out.step("updated Acme's phone number".to_string());

    if let Some(id) = first_product {
        catalog.update_product(
            id,
            ProductUpdate {
                caracteristicas: Some("Grano tostado, 1 kg".to_string()),
                ..Default::default()
            },
            actor,
        )?;
        out.step(format!("updated product #{}", id));
    }

    for (email, role) in sample_users() {
        catalog.create_user(email, role, actor)?;
        out.step(format!("created user {} as {}", email, role));
    }
    catalog.delete_user("ventas@acme.example", actor)?;
    out.step("deleted user ventas@acme.example".to_string());

    let removed = catalog.delete_company("900123456", actor)?;
    out.step(format!("deleted company {} with its products and stock", removed.nombre));

    Ok(out)
}
