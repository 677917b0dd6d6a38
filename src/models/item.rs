// src/models/item.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "unit_of_measure")]
pub enum UnitOfMeasure {
    #[sqlx(rename = "UN")]
    #[serde(rename = "UN")]
    Unit,
    #[sqlx(rename = "CX")]
    #[serde(rename = "CX")]
    Box,
    #[sqlx(rename = "FD")]
    #[serde(rename = "FD")]
    Bundle,
    #[sqlx(rename = "KG")]
    #[serde(rename = "KG")]
    Kilogram,
    #[sqlx(rename = "TON")]
    #[serde(rename = "TON")]
    Ton,
}

impl UnitOfMeasure {
    pub fn code(&self) -> &'static str {
        match self {
            UnitOfMeasure::Unit => "UN",
            UnitOfMeasure::Box => "CX",
            UnitOfMeasure::Bundle => "FD",
            UnitOfMeasure::Kilogram => "KG",
            UnitOfMeasure::Ton => "TON",
        }
    }
}

// --- Item da Grade (2º nível: o agrupamento de negociação) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub grade_id: Uuid,
    #[schema(example = "Suco Tang Diversos Sabores 25g")]
    pub description: String,
    pub unit: UnitOfMeasure,
    #[schema(example = "12")]
    pub package_quantity: Decimal,   // Ex: 12 (caixa com 12 un)
    #[schema(example = "1000")]
    pub negotiated_volume: Decimal,  // Volume total negociado (em embalagens)
    pub gross_unit_cost: Decimal,    // Custo com impostos
    pub net_unit_cost: Decimal,
    pub sell_in_allowance: Decimal,
    pub invoice_discount_pct: Decimal, // 5.00 = 5%
}

// --- SKU (código do ERP vinculado ao item) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sku {
    pub id: Uuid,
    pub item_id: Uuid,
    #[schema(example = "104523")]
    pub product_code: String,
    pub product_description: String,
    pub package: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,
    pub skus: Vec<Sku>,
}
