//! The reference catalog and its use cases.
//!
//! Every use case applies its change to the in-memory catalog first, then
//! records one block per affected entity through the `TransactionRecorder`.
//! There is no implicit hook: the record call sits in the use case itself,
//! next to the mutation it describes.  The catalog lock is held until the
//! blocks are written, so ledger order is mutation order.
//!
//! A failed ledger write does not undo the catalog change.  The failure is
//! logged and returned as `CatalogError::Ledger` so the caller knows the
//! change is live but missing from the audit chain.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use chainlog_contracts::{Block, LedgerError, TransactionType};
use chainlog_core::TransactionRecorder;

use crate::events;
use crate::model::{
    Company, CompanyUpdate, Currency, InventoryItem, NewProduct, Product, ProductUpdate, User,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} '{key}' already exists")]
    Duplicate { entity: &'static str, key: String },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("business rule violated: {0}")]
    BusinessRule(String),

    #[error("catalog state unavailable: {0}")]
    Unavailable(String),

    /// The catalog change was applied but its block was not written.
    #[error("change applied but not recorded on the ledger: {0}")]
    Ledger(#[from] LedgerError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

type Pending = Vec<(TransactionType, Value)>;

#[derive(Default)]
struct CatalogState {
    companies: BTreeMap<String, Company>,
    products: BTreeMap<u64, Product>,
    inventory: BTreeMap<u64, InventoryItem>,
    users: BTreeMap<String, User>,
    last_product_id: u64,
    last_inventory_id: u64,
}

impl CatalogState {
    fn company(&self, nit: &str) -> CatalogResult<&Company> {
        self.companies.get(nit).ok_or_else(|| not_found("company", nit))
    }

    fn product_name(&self, id: u64) -> Option<&str> {
        self.products.get(&id).map(|p| p.nombre.as_str())
    }

    fn inventory_removed(&self, item: &InventoryItem) -> (TransactionType, Value) {
        (
            TransactionType::InventoryDeleted,
            events::inventory_removed(item, self.product_name(item.producto_id)),
        )
    }

    fn inventory_snapshot(&self, item: &InventoryItem) -> (TransactionType, Value) {
        (
            TransactionType::InventoryUpdated,
            events::inventory_snapshot(item, self.product_name(item.producto_id)),
        )
    }

    /// Remove a product and its stock.  Returns the events in deletion
    /// order: stock first, product last.
    fn remove_product(&mut self, id: u64) -> Option<(Product, Pending)> {
        let stock: Vec<u64> = self
            .inventory
            .values()
            .filter(|i| i.producto_id == id)
            .map(|i| i.id)
            .collect();

        let mut pending = Pending::new();
        for item_id in stock {
            if let Some(item) = self.inventory.remove(&item_id) {
                let event = self.inventory_removed(&item);
                pending.push(event);
            }
        }
        let product = self.products.remove(&id)?;
        pending.push((TransactionType::ProductDeleted, events::product_removed(&product)));
        Some((product, pending))
    }
}

/// In-memory companies, products, inventory, and users, audited on the
/// ledger.
pub struct Catalog {
    recorder: TransactionRecorder,
    state: Mutex<CatalogState>,
}

impl Catalog {
    pub fn new(recorder: TransactionRecorder) -> Self {
        Self {
            recorder,
            state: Mutex::new(CatalogState::default()),
        }
    }

    // ── Companies ─────────────────────────────────────────────────────────────

    pub fn create_company(&self, company: Company, actor: &str) -> CatalogResult<Company> {
        require("nit", &company.nit)?;
        require("nombre", &company.nombre)?;
        let mut state = self.lock()?;
        if state.companies.contains_key(&company.nit) {
            return Err(CatalogError::Duplicate {
                entity: "company",
                key: company.nit.clone(),
            });
        }
        state.companies.insert(company.nit.clone(), company.clone());
        self.record(TransactionType::CompanyCreated, events::company_snapshot(&company), actor)?;
        Ok(company)
    }

    pub fn update_company(
        &self,
        nit: &str,
        update: CompanyUpdate,
        actor: &str,
    ) -> CatalogResult<Company> {
        if let Some(nombre) = &update.nombre {
            require("nombre", nombre)?;
        }
        let mut state = self.lock()?;
        let company = state
            .companies
            .get_mut(nit)
            .ok_or_else(|| not_found("company", nit))?;
        if let Some(nombre) = update.nombre {
            company.nombre = nombre;
        }
        if let Some(direccion) = update.direccion {
            company.direccion = direccion;
        }
        if let Some(telefono) = update.telefono {
            company.telefono = telefono;
        }
        let updated = company.clone();
        self.record(TransactionType::CompanyModified, events::company_snapshot(&updated), actor)?;
        Ok(updated)
    }

    /// Delete a company together with its products and stock.  One block is
    /// recorded per removed entity, dependents first.
    pub fn delete_company(&self, nit: &str, actor: &str) -> CatalogResult<Company> {
        let mut state = self.lock()?;
        state.company(nit)?;

        let mut pending = Pending::new();
        let orphaned: Vec<u64> = state
            .inventory
            .values()
            .filter(|i| i.empresa == nit)
            .map(|i| i.id)
            .collect();
        for id in orphaned {
            if let Some(item) = state.inventory.remove(&id) {
                let event = state.inventory_removed(&item);
                pending.push(event);
            }
        }
        let owned: Vec<u64> = state
            .products
            .values()
            .filter(|p| p.empresa == nit)
            .map(|p| p.id)
            .collect();
        for id in owned {
            if let Some((_, events)) = state.remove_product(id) {
                pending.extend(events);
            }
        }
        let company = state
            .companies
            .remove(nit)
            .ok_or_else(|| not_found("company", nit))?;
        pending.push((TransactionType::CompanyDeleted, events::company_removed(&company)));
        self.record_all(pending, actor)?;
        Ok(company)
    }

    pub fn company(&self, nit: &str) -> CatalogResult<Company> {
        Ok(self.lock()?.company(nit)?.clone())
    }

    pub fn companies(&self) -> CatalogResult<Vec<Company>> {
        Ok(self.lock()?.companies.values().cloned().collect())
    }

    /// Case-insensitive match on `nit` or `nombre`.
    pub fn search_companies(&self, term: &str) -> CatalogResult<Vec<Company>> {
        let needle = term.to_lowercase();
        Ok(self
            .lock()?
            .companies
            .values()
            .filter(|c| {
                c.nit.to_lowercase().contains(&needle) || c.nombre.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    // ── Products ──────────────────────────────────────────────────────────────

    pub fn create_product(&self, new: NewProduct, actor: &str) -> CatalogResult<Product> {
        require("codigo", &new.codigo)?;
        require("nombre", &new.nombre)?;
        let mut state = self.lock()?;
        state.company(&new.empresa)?;
        if state.products.values().any(|p| p.codigo == new.codigo) {
            return Err(CatalogError::Duplicate {
                entity: "product",
                key: new.codigo,
            });
        }
        state.last_product_id += 1;
        let product = Product {
            id: state.last_product_id,
            codigo: new.codigo,
            nombre: new.nombre,
            caracteristicas: new.caracteristicas,
            empresa: new.empresa,
            precios: BTreeMap::new(),
        };
        state.products.insert(product.id, product.clone());
        self.record(TransactionType::ProductCreated, events::product_snapshot(&product), actor)?;
        Ok(product)
    }

    pub fn update_product(
        &self,
        id: u64,
        update: ProductUpdate,
        actor: &str,
    ) -> CatalogResult<Product> {
        if let Some(nombre) = &update.nombre {
            require("nombre", nombre)?;
        }
        let mut state = self.lock()?;
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| not_found("product", &id.to_string()))?;
        if let Some(nombre) = update.nombre {
            product.nombre = nombre;
        }
        if let Some(caracteristicas) = update.caracteristicas {
            product.caracteristicas = caracteristicas;
        }
        let updated = product.clone();
        self.record(TransactionType::ProductModified, events::product_snapshot(&updated), actor)?;
        Ok(updated)
    }

    /// Set or replace the product's price in one currency.  Recorded as a
    /// product modification.
    pub fn set_price(
        &self,
        id: u64,
        currency: Currency,
        price: f64,
        actor: &str,
    ) -> CatalogResult<Product> {
        if !price.is_finite() || price < 0.0 {
            return Err(CatalogError::Validation(format!(
                "price must be a non-negative number, got {}",
                price
            )));
        }
        let mut state = self.lock()?;
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| not_found("product", &id.to_string()))?;
        product.precios.insert(currency, price);
        let updated = product.clone();
        debug!(product = id, %currency, price, "price set");
        self.record(TransactionType::ProductModified, events::product_snapshot(&updated), actor)?;
        Ok(updated)
    }

    /// Delete a product and its stock entries.
    pub fn delete_product(&self, id: u64, actor: &str) -> CatalogResult<Product> {
        let mut state = self.lock()?;
        let (product, pending) = state
            .remove_product(id)
            .ok_or_else(|| not_found("product", &id.to_string()))?;
        self.record_all(pending, actor)?;
        Ok(product)
    }

    pub fn product(&self, id: u64) -> CatalogResult<Product> {
        self.lock()?
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("product", &id.to_string()))
    }

    pub fn products(&self) -> CatalogResult<Vec<Product>> {
        Ok(self.lock()?.products.values().cloned().collect())
    }

    // ── Inventory ─────────────────────────────────────────────────────────────

    /// Open a stock entry for `codigo` at company `empresa`.
    pub fn create_inventory(
        &self,
        empresa: &str,
        codigo: &str,
        cantidad: u64,
        ubicacion: &str,
        actor: &str,
    ) -> CatalogResult<InventoryItem> {
        let mut state = self.lock()?;
        state.company(empresa)?;
        let producto_id = state
            .products
            .values()
            .find(|p| p.codigo == codigo)
            .map(|p| p.id)
            .ok_or_else(|| not_found("product", codigo))?;
        if state
            .inventory
            .values()
            .any(|i| i.empresa == empresa && i.producto_id == producto_id)
        {
            return Err(CatalogError::Duplicate {
                entity: "inventory item",
                key: format!("{}/{}", empresa, codigo),
            });
        }
        state.last_inventory_id += 1;
        let item = InventoryItem {
            id: state.last_inventory_id,
            empresa: empresa.to_string(),
            producto_id,
            cantidad,
            ubicacion: ubicacion.to_string(),
        };
        state.inventory.insert(item.id, item.clone());
        let (kind, payload) = state.inventory_snapshot(&item);
        self.record(kind, payload, actor)?;
        Ok(item)
    }

    pub fn update_inventory(
        &self,
        id: u64,
        cantidad: Option<u64>,
        ubicacion: Option<String>,
        actor: &str,
    ) -> CatalogResult<InventoryItem> {
        self.change_stock(id, actor, |item| {
            if let Some(cantidad) = cantidad {
                item.cantidad = cantidad;
            }
            if let Some(ubicacion) = ubicacion {
                item.ubicacion = ubicacion;
            }
            Ok(())
        })
    }

    pub fn add_stock(&self, id: u64, amount: u64, actor: &str) -> CatalogResult<InventoryItem> {
        self.change_stock(id, actor, |item| {
            item.cantidad = item.cantidad.checked_add(amount).ok_or_else(|| {
                CatalogError::Validation(format!("stock overflow adding {}", amount))
            })?;
            Ok(())
        })
    }

    /// Fails without any change when less than `amount` is in stock.
    pub fn remove_stock(&self, id: u64, amount: u64, actor: &str) -> CatalogResult<InventoryItem> {
        self.change_stock(id, actor, |item| {
            let available = item.cantidad;
            item.cantidad = available.checked_sub(amount).ok_or_else(|| {
                CatalogError::BusinessRule(format!(
                    "insufficient stock: {} available, {} requested",
                    available, amount
                ))
            })?;
            Ok(())
        })
    }

    pub fn delete_inventory(&self, id: u64, actor: &str) -> CatalogResult<InventoryItem> {
        let mut state = self.lock()?;
        let item = state
            .inventory
            .remove(&id)
            .ok_or_else(|| not_found("inventory item", &id.to_string()))?;
        let (kind, payload) = state.inventory_removed(&item);
        self.record(kind, payload, actor)?;
        Ok(item)
    }

    pub fn inventory_item(&self, id: u64) -> CatalogResult<InventoryItem> {
        self.lock()?
            .inventory
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("inventory item", &id.to_string()))
    }

    pub fn inventory(&self) -> CatalogResult<Vec<InventoryItem>> {
        Ok(self.lock()?.inventory.values().cloned().collect())
    }

    // ── Users ─────────────────────────────────────────────────────────────────

    pub fn create_user(&self, email: &str, role: &str, actor: &str) -> CatalogResult<User> {
        if !email.contains('@') {
            return Err(CatalogError::Validation(format!("invalid email '{}'", email)));
        }
        require("role", role)?;
        let user = User {
            email: email.to_string(),
            role: role.to_string(),
        };
        let mut state = self.lock()?;
        if state.users.contains_key(email) {
            return Err(CatalogError::Duplicate {
                entity: "user",
                key: email.to_string(),
            });
        }
        state.users.insert(user.email.clone(), user.clone());
        self.record(TransactionType::UserCreated, events::user_snapshot(&user), actor)?;
        Ok(user)
    }

    pub fn delete_user(&self, email: &str, actor: &str) -> CatalogResult<User> {
        let mut state = self.lock()?;
        let user = state
            .users
            .remove(email)
            .ok_or_else(|| not_found("user", email))?;
        self.record(TransactionType::UserDeleted, events::user_snapshot(&user), actor)?;
        Ok(user)
    }

    pub fn users(&self) -> CatalogResult<Vec<User>> {
        Ok(self.lock()?.users.values().cloned().collect())
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn lock(&self) -> CatalogResult<MutexGuard<'_, CatalogState>> {
        self.state
            .lock()
            .map_err(|e| CatalogError::Unavailable(e.to_string()))
    }

    /// Apply `change` to one stock entry and record the new snapshot.  A
    /// failing `change` leaves the entry untouched.
    fn change_stock<F>(&self, id: u64, actor: &str, change: F) -> CatalogResult<InventoryItem>
    where
        F: FnOnce(&mut InventoryItem) -> CatalogResult<()>,
    {
        let mut state = self.lock()?;
        let mut item = state
            .inventory
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("inventory item", &id.to_string()))?;
        change(&mut item)?;
        state.inventory.insert(id, item.clone());
        let (kind, payload) = state.inventory_snapshot(&item);
        self.record(kind, payload, actor)?;
        Ok(item)
    }

    fn record(&self, kind: TransactionType, payload: Value, actor: &str) -> CatalogResult<Block> {
        self.recorder.record_type(kind, &payload, actor).map_err(|e| {
            error!(
                kind = %kind,
                actor,
                payload = %payload,
                "catalog change kept without an audit block"
            );
            CatalogError::from(e)
        })
    }

    /// Record every event in order.  A failed event is logged and skipped
    /// so the rest still reach the ledger; the first failure is returned.
    fn record_all(&self, pending: Pending, actor: &str) -> CatalogResult<()> {
        let mut first_failure = None;
        for (kind, payload) in pending {
            if let Err(e) = self.record(kind, payload, actor) {
                first_failure.get_or_insert(e);
            }
        }
        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn require(field: &str, value: &str) -> CatalogResult<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn not_found(entity: &'static str, key: &str) -> CatalogError {
    CatalogError::NotFound {
        entity,
        key: key.to_string(),
    }
}
