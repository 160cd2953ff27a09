//! Payload builders for catalog events.
//!
//! The key names are part of every recorded hash, so they are fixed here
//! once and must not change.

use serde_json::{json, Value};

use crate::model::{Company, InventoryItem, Product, User};

pub fn company_snapshot(company: &Company) -> Value {
    json!({
        "nit": company.nit,
        "nombre": company.nombre,
        "direccion": company.direccion,
        "telefono": company.telefono,
    })
}

pub fn company_removed(company: &Company) -> Value {
    json!({
        "nit": company.nit,
        "nombre": company.nombre,
    })
}

pub fn product_snapshot(product: &Product) -> Value {
    json!({
        "id": product.id,
        "codigo": product.codigo,
        "nombre": product.nombre,
        "empresa": product.empresa,
    })
}

pub fn product_removed(product: &Product) -> Value {
    json!({
        "id": product.id,
        "codigo": product.codigo,
        "nombre": product.nombre,
    })
}

/// `producto` carries the product's name, not its id.  A dangling product
/// reference is recorded as `null`.
pub fn inventory_snapshot(item: &InventoryItem, product_name: Option<&str>) -> Value {
    json!({
        "id": item.id,
        "empresa": item.empresa,
        "producto": product_name,
        "cantidad": item.cantidad,
        "ubicacion": item.ubicacion,
    })
}

pub fn inventory_removed(item: &InventoryItem, product_name: Option<&str>) -> Value {
    json!({
        "id": item.id,
        "empresa": item.empresa,
        "producto": product_name,
    })
}

/// Used for both creation and deletion.
pub fn user_snapshot(user: &User) -> Value {
    json!({
        "email": user.email,
        "role": user.role,
    })
}
