// src/models/dashboard.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

// 1. Linha da apuração: (loja, produto) com meta e os três baldes de compra
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationRow {
    pub store: String,
    pub product: String,
    pub meta: Decimal,
    pub aderente: Decimal,   // Fornecedor da grade, dentro da vigência
    pub fora_prazo: Decimal, // Fornecedor da grade, após o fim da grade
    pub outros: Decimal,     // Fornecedor fora da grade (vazamento)
}

// 2. Totais (os Cards do Topo)
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationTotals {
    pub meta: Decimal,
    pub aderente: Decimal,
    pub fora_prazo: Decimal,
    pub outros: Decimal,
    pub adherence_pct: Option<Decimal>,
}

// 3. Linha do tempo (data × loja)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub date: NaiveDate,
    pub store: String,
    pub aderente: Decimal,
    pub outros: Decimal,
    pub fora_prazo: Decimal,
}

// 4. Ranking de fornecedores fora da grade
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Offender {
    pub tax_id: String,
    pub supplier_name: String,
    pub volume: Decimal,
    pub estimated_value: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GradeDashboard {
    pub grade_id: Uuid,
    pub window_start: NaiveDate,
    pub grade_end: NaiveDate,
    pub window_end: NaiveDate,
    pub totals: ReconciliationTotals,
    pub rows: Vec<ReconciliationRow>,
    pub timeline: Vec<TimelineEntry>,
    pub offenders: Vec<Offender>,
}
