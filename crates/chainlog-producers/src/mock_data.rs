//! Fictional catalog data for demos and tests.

use crate::model::{Company, Currency, NewProduct};

pub fn sample_companies() -> Vec<Company> {
    vec![
        Company {
            nit: "900123456".to_string(),
            nombre: "Acme".to_string(),
            direccion: "Calle 10 # 20-30, Bogotá".to_string(),
            telefono: "+57 601 555 0101".to_string(),
        },
        Company {
            nit: "800987654".to_string(),
            nombre: "Café del Valle".to_string(),
            direccion: "Carrera 5 # 12-40, Cali".to_string(),
            telefono: "+57 602 555 0199".to_string(),
        },
    ]
}

pub fn sample_products() -> Vec<NewProduct> {
    vec![
        NewProduct {
            codigo: "P-001".to_string(),
            nombre: "Café".to_string(),
            caracteristicas: "Grano tostado, 500 g".to_string(),
            empresa: "800987654".to_string(),
        },
        NewProduct {
            codigo: "P-002".to_string(),
            nombre: "Panela".to_string(),
            caracteristicas: "Bloque de 1 kg".to_string(),
            empresa: "800987654".to_string(),
        },
        NewProduct {
            codigo: "A-100".to_string(),
            nombre: "Anvil".to_string(),
            caracteristicas: "Forged steel".to_string(),
            empresa: "900123456".to_string(),
        },
    ]
}

/// `(product codigo, currency, price)`.
pub fn sample_prices() -> Vec<(&'static str, Currency, f64)> {
    vec![
        ("P-001", Currency::Cop, 32000.0),
        ("P-001", Currency::Usd, 12.5),
        ("P-002", Currency::Cop, 6500.0),
        ("A-100", Currency::Usd, 199.99),
        ("A-100", Currency::Eur, 185.0),
    ]
}

/// `(email, role)`.
pub fn sample_users() -> Vec<(&'static str, &'static str)> {
    vec![
        ("admin@acme.example", "administrador"),
        ("ventas@acme.example", "externo"),
    ]
}
