// src/models/catalog.rs
//
// Registros vindos do warehouse analítico (somente leitura).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

// Compra realizada por uma loja (fato de compras, já agregado por dia)
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRecord {
    pub date: NaiveDate,
    pub store_name: String,
    pub product_code: String,
    pub supplier_tax_id: String,
    pub supplier_name: String,
    pub quantity: Decimal,
}

// Venda sumarizada por loja, base do histórico de participação
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSales {
    pub store_name: String,
    pub quantity: Decimal,
    pub gross_value: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductHit {
    pub code: String,
    pub description: String,
    pub package: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierGroupHit {
    pub code: String,
    pub name: String,
}
