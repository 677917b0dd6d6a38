// src/models/history.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// Soma das participações de uma loja no trimestre mais recente
#[derive(Debug, Clone, FromRow)]
pub struct StoreShareRow {
    pub store_name: String,
    pub share_pct: Decimal,
}

// Linha do snapshot histórico, pronta para gravar
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreShareSnapshot {
    pub store_name: String,
    pub quantity: Decimal,
    pub gross_value: Decimal,
    pub share_pct: Decimal,
}

// Trimestre anterior: [número, início, fim, ano]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuarterWindow {
    pub quarter: u32,
    pub year: i32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub window: QuarterWindow,
    pub stores: usize,
    pub rows: Vec<StoreShareSnapshot>,
}
