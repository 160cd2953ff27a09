//! Catalog entities.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Currencies a product can be priced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Cop,
    Usd,
    Eur,
    Mxn,
    Brl,
    Ars,
    Gbp,
}

impl Currency {
    pub const ALL: [Currency; 7] = [
        Currency::Cop,
        Currency::Usd,
        Currency::Eur,
        Currency::Mxn,
        Currency::Brl,
        Currency::Ars,
        Currency::Gbp,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Cop => "COP",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Mxn => "MXN",
            Currency::Brl => "BRL",
            Currency::Ars => "ARS",
            Currency::Gbp => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.code() == upper)
            .ok_or_else(|| format!("unsupported currency '{}'", s))
    }
}

/// A company, identified by its tax id (`nit`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub nit: String,
    pub nombre: String,
    pub direccion: String,
    pub telefono: String,
}

/// Partial update for a company.  `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct CompanyUpdate {
    pub nombre: Option<String>,
    pub direccion: Option<String>,
    pub telefono: Option<String>,
}

/// A product owned by one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    /// Unique across the catalog.
    pub codigo: String,
    pub nombre: String,
    pub caracteristicas: String,
    /// `nit` of the owning company.
    pub empresa: String,
    pub precios: BTreeMap<Currency, f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub nombre: Option<String>,
    pub caracteristicas: Option<String>,
}

/// Stock of one product held by one company.  At most one item exists per
/// (company, product) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: u64,
    pub empresa: String,
    pub producto_id: u64,
    pub cantidad: u64,
    pub ubicacion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub role: String,
}

/// Input for a new product.  The catalog assigns the id.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub codigo: String,
    pub nombre: String,
    pub caracteristicas: String,
    pub empresa: String,
}
