// src/models/grade.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::item::Item;

// --- Status da Grade ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "grade_status", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum GradeStatus {
    Draft,       // "DRAFT" (rascunho)
    UnderReview, // "UNDER_REVIEW" (em análise)
    Approved,
    Concluded,
    Cancelled,
}

// --- Grade de Compra (1º nível) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: Uuid,
    pub event_id: Uuid,
    pub buyer_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
    pub status: GradeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha da listagem: a grade já com os nomes resolvidos
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GradeSummary {
    pub id: Uuid,
    pub event_id: Uuid,
    pub event_description: String,
    pub buyer_name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: GradeStatus,
    pub item_count: i64,
    pub group_names: Option<String>,
}

// --- Grupo econômico / fornecedor vinculado à grade ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierGroupLink {
    pub id: Uuid,
    pub grade_id: Uuid,
    #[schema(example = "1043")]
    pub group_code: String,
    #[schema(example = "MONDELEZ")]
    pub group_name: String,
}

// Totais por item, usados tanto no detalhe quanto na finalização
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemAllocationTotal {
    pub item_id: Uuid,
    pub description: String,
    pub negotiated_volume: Decimal,
    pub allocated_volume: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemOverview {
    #[serde(flatten)]
    pub item: Item,
    pub allocated_volume: Decimal,
    pub difference: Decimal,
    pub is_balanced: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GradeDetail {
    #[serde(flatten)]
    pub header: Grade,
    pub event_description: String,
    pub event_end_date: NaiveDate,
    pub groups: Vec<SupplierGroupLink>,
    pub items: Vec<ItemOverview>,
}
