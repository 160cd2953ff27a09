//! # chainlog-producers
//!
//! Reference event producers for the chainlog ledger.
//!
//! [`Catalog`] manages companies, products with prices in several
//! currencies, per-company inventory, and users.  Each use case mutates the
//! catalog and then records what it did through the
//! `TransactionRecorder`, using the payload shapes in [`events`].
//!
//! All data is in memory and fictional; [`scenario::run_demo`] drives a
//! walkthrough over [`mock_data`].

pub mod catalog;
pub mod events;
pub mod mock_data;
pub mod model;
pub mod scenario;

pub use catalog::{Catalog, CatalogError, CatalogResult};
pub use model::{
    Company, CompanyUpdate, Currency, InventoryItem, NewProduct, Product, ProductUpdate, User,
};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use serde_json::{json, Value};

    use chainlog_contracts::{Block, BlockFilter, LedgerError, LedgerResult, TransactionType};
    use chainlog_core::{LedgerService, LedgerStore};
    use chainlog_store::InMemoryLedgerStore;

    use crate::events::company_snapshot;
    use crate::mock_data::sample_companies;
    use crate::scenario::run_demo;
    use crate::{Catalog, CatalogError, CompanyUpdate, Currency, NewProduct};

    // ── Helpers ───────────────────────────────────────────────────────────────

    const ADMIN: &str = "admin@x.com";

    fn setup() -> (Catalog, LedgerService) {
        let service = LedgerService::new(Arc::new(InMemoryLedgerStore::new()));
        (Catalog::new(service.recorder().clone()), service)
    }

    fn blocks(service: &LedgerService) -> Vec<Block> {
        service.list(&BlockFilter::default()).unwrap()
    }

    fn kinds(service: &LedgerService) -> Vec<String> {
        blocks(service).into_iter().map(|b| b.kind).collect()
    }

    fn seeded() -> (Catalog, LedgerService) {
        let (catalog, service) = setup();
        for company in sample_companies() {
            catalog.create_company(company, ADMIN).unwrap();
        }
        catalog
            .create_product(
                NewProduct {
                    codigo: "P-001".to_string(),
                    nombre: "Café".to_string(),
                    caracteristicas: String::new(),
                    empresa: "800987654".to_string(),
                },
                ADMIN,
            )
            .unwrap();
        (catalog, service)
    }

    /// Accepts nothing.
    struct BrokenLedger;

    impl LedgerStore for BrokenLedger {
        fn append(&self, _: &str, _: &Value, _: &str) -> LedgerResult<Block> {
            Err(LedgerError::Storage {
                reason: "disk full".to_string(),
            })
        }
        fn get_last(&self) -> LedgerResult<Option<Block>> {
            Ok(None)
        }
        fn get(&self, _: u64) -> LedgerResult<Option<Block>> {
            Ok(None)
        }
        fn list_ordered(&self) -> LedgerResult<Vec<Block>> {
            Ok(Vec::new())
        }
        fn count(&self) -> LedgerResult<u64> {
            Ok(0)
        }
        fn clear_all(&self) -> LedgerResult<u64> {
            Ok(0)
        }
    }

    /// Refuses one transaction type and passes everything else through.
    struct RefusingLedger {
        inner: InMemoryLedgerStore,
        refused: &'static str,
    }

    impl LedgerStore for RefusingLedger {
        fn append(&self, kind: &str, payload: &Value, actor: &str) -> LedgerResult<Block> {
            if kind == self.refused {
                return Err(LedgerError::Storage {
                    reason: format!("{} refused", kind),
                });
            }
            self.inner.append(kind, payload, actor)
        }
        fn get_last(&self) -> LedgerResult<Option<Block>> {
            self.inner.get_last()
        }
        fn get(&self, sequence: u64) -> LedgerResult<Option<Block>> {
            self.inner.get(sequence)
        }
        fn list_ordered(&self) -> LedgerResult<Vec<Block>> {
            self.inner.list_ordered()
        }
        fn count(&self) -> LedgerResult<u64> {
            self.inner.count()
        }
        fn clear_all(&self) -> LedgerResult<u64> {
            self.inner.clear_all()
        }
    }

    // ── 1. payload shapes ─────────────────────────────────────────────────────

    #[test]
    fn company_events_use_fixed_keys() {
        let (catalog, service) = seeded();
        catalog.delete_company("900123456", "ops@x.com").unwrap();

        let all = blocks(&service);
        assert_eq!(all[0].kind, "company-created");
        assert_eq!(
            all[0].payload,
            json!({
                "nit": "900123456",
                "nombre": "Acme",
                "direccion": "Calle 10 # 20-30, Bogotá",
                "telefono": "+57 601 555 0101",
            })
        );
        assert_eq!(all[0].actor, ADMIN);

        let last = all.last().unwrap();
        assert_eq!(last.kind, "company-deleted");
        assert_eq!(last.payload, json!({ "nit": "900123456", "nombre": "Acme" }));
        assert_eq!(last.actor, "ops@x.com");
    }

    #[test]
    fn product_and_inventory_payloads() {
        let (catalog, service) = seeded();
        let item = catalog
            .create_inventory("800987654", "P-001", 10, "Bodega 1", ADMIN)
            .unwrap();

        let all = blocks(&service);
        let product = &all[2];
        assert_eq!(product.kind, "product-created");
        assert_eq!(
            product.payload,
            json!({ "id": 1, "codigo": "P-001", "nombre": "Café", "empresa": "800987654" })
        );

        let stock = &all[3];
        assert_eq!(stock.kind, "inventory-updated");
        assert_eq!(
            stock.payload,
            json!({
                "id": item.id,
                "empresa": "800987654",
                "producto": "Café",
                "cantidad": 10,
                "ubicacion": "Bodega 1",
            })
        );
    }

    #[test]
    fn price_change_is_a_product_modification() {
        let (catalog, service) = seeded();
        let product = catalog.set_price(1, Currency::Usd, 12.5, ADMIN).unwrap();
        assert_eq!(product.precios.get(&Currency::Usd), Some(&12.5));

        let last = blocks(&service).pop().unwrap();
        assert_eq!(last.transaction_type(), Some(TransactionType::ProductModified));

        let err = catalog.set_price(1, Currency::Eur, -1.0, ADMIN).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert_eq!(service.count().unwrap(), 4, "invalid price must not be recorded");
    }

    // ── 2. cascades ───────────────────────────────────────────────────────────

    #[test]
    fn deleting_company_records_dependents_first() {
        let (catalog, service) = seeded();
        catalog
            .create_inventory("800987654", "P-001", 5, "", ADMIN)
            .unwrap();
        let before = service.count().unwrap() as usize;

        catalog.delete_company("800987654", ADMIN).unwrap();

        let tail: Vec<String> = kinds(&service).split_off(before);
        assert_eq!(tail, vec!["inventory-deleted", "product-deleted", "company-deleted"]);
        assert!(catalog.products().unwrap().is_empty());
        assert!(catalog.inventory().unwrap().is_empty());

        let removed_stock = &blocks(&service)[before];
        assert_eq!(removed_stock.payload["producto"], json!("Café"));
    }

    #[test]
    fn deleting_product_removes_its_stock() {
        let (catalog, service) = seeded();
        catalog
            .create_inventory("900123456", "P-001", 1, "", ADMIN)
            .unwrap();
        catalog.delete_product(1, ADMIN).unwrap();

        let all = kinds(&service);
        assert_eq!(&all[all.len() - 2..], ["inventory-deleted", "product-deleted"]);
    }

    // ── 3. rejected use cases record nothing ──────────────────────────────────

    #[test]
    fn failed_use_cases_leave_no_block() {
        let (catalog, service) = seeded();
        let before = service.count().unwrap();

        let dup = catalog.create_company(sample_companies().remove(0), ADMIN);
        assert!(matches!(dup, Err(CatalogError::Duplicate { .. })));

        let orphan = catalog.create_product(
            NewProduct {
                codigo: "X-1".to_string(),
                nombre: "Ghost".to_string(),
                caracteristicas: String::new(),
                empresa: "000".to_string(),
            },
            ADMIN,
        );
        assert!(matches!(orphan, Err(CatalogError::NotFound { .. })));

        let item = catalog
            .create_inventory("800987654", "P-001", 2, "", ADMIN)
            .unwrap();
        let short = catalog.remove_stock(item.id, 3, ADMIN);
        assert!(matches!(short, Err(CatalogError::BusinessRule(_))));
        assert_eq!(catalog.inventory_item(item.id).unwrap().cantidad, 2);

        assert!(matches!(
            catalog.create_user("not-an-email", "externo", ADMIN),
            Err(CatalogError::Validation(_))
        ));

        assert_eq!(service.count().unwrap(), before + 1, "only the inventory entry is recorded");
    }

    // ── 4. ledger failure ─────────────────────────────────────────────────────

    #[test]
    fn ledger_failure_surfaces_but_keeps_the_change() {
        let service = LedgerService::new(Arc::new(BrokenLedger));
        let catalog = Catalog::new(service.recorder().clone());

        let err = catalog
            .create_company(sample_companies().remove(0), ADMIN)
            .unwrap_err();
        assert!(matches!(err, CatalogError::Ledger(LedgerError::Storage { .. })));
        assert!(err.to_string().contains("disk full"));
        assert_eq!(catalog.company("900123456").unwrap().nombre, "Acme");
    }

    #[test]
    fn cascade_keeps_recording_after_a_failed_block() {
        let service = LedgerService::new(Arc::new(RefusingLedger {
            inner: InMemoryLedgerStore::new(),
            refused: "product-deleted",
        }));
        let catalog = Catalog::new(service.recorder().clone());
        for company in sample_companies() {
            catalog.create_company(company, ADMIN).unwrap();
        }
        catalog
            .create_product(
                NewProduct {
                    codigo: "P-001".to_string(),
                    nombre: "Café".to_string(),
                    caracteristicas: String::new(),
                    empresa: "800987654".to_string(),
                },
                ADMIN,
            )
            .unwrap();
        catalog
            .create_inventory("800987654", "P-001", 5, "", ADMIN)
            .unwrap();
        let before = service.count().unwrap() as usize;

        let err = catalog.delete_company("800987654", ADMIN).unwrap_err();
        assert!(matches!(err, CatalogError::Ledger(LedgerError::Storage { .. })));
        assert!(err.to_string().contains("product-deleted"));

        let tail: Vec<String> = kinds(&service).split_off(before);
        assert_eq!(tail, vec!["inventory-deleted", "company-deleted"]);
        assert!(catalog.company("800987654").is_err(), "the delete itself stands");
        assert!(service.verify().unwrap().valid);
    }

    // ── 5. concurrent use cases ───────────────────────────────────────────────

    #[test]
    fn ledger_order_follows_catalog_order() {
        let (catalog, service) = seeded();
        let catalog = Arc::new(catalog);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let catalog = Arc::clone(&catalog);
                thread::spawn(move || {
                    for i in 0..25 {
                        let update = CompanyUpdate {
                            nombre: Some(format!("Acme {}-{}", t, i)),
                            telefono: Some(format!("+57 {}", t * 100 + i)),
                            ..CompanyUpdate::default()
                        };
                        catalog.update_company("900123456", update, ADMIN).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let last = blocks(&service)
            .into_iter()
            .filter(|b| b.kind == "company-modified")
            .last()
            .unwrap();
        let current = catalog.company("900123456").unwrap();
        assert_eq!(last.payload, company_snapshot(&current));
        assert_eq!(service.count().unwrap(), 3 + 8 * 25);
        assert!(service.verify().unwrap().valid);
    }

    // ── 6. demo walkthrough ───────────────────────────────────────────────────

    #[test]
    fn demo_covers_every_type_and_verifies() {
        let (catalog, service) = setup();
        let outcome = run_demo(&catalog, ADMIN).unwrap();
        assert!(!outcome.steps.is_empty());

        assert_eq!(service.count().unwrap(), 21);
        let stats = service.statistics().unwrap();
        assert!(stats.currently_valid);
        assert_eq!(stats.counts_by_type.len(), TransactionType::ALL.len());
        assert_eq!(stats.counts_by_type[0].kind, "product-modified");
        assert_eq!(stats.counts_by_type[0].total, 6);
    }

    #[test]
    fn search_matches_nit_or_name() {
        let (catalog, _) = seeded();
        assert_eq!(catalog.search_companies("café").unwrap().len(), 1);
        assert_eq!(catalog.search_companies("9001").unwrap().len(), 1);
        assert_eq!(catalog.search_companies("").unwrap().len(), 2);
    }
}
