// src/models/distribution.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Distribuição por Associado (3º nível, paralelo aos SKUs) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub id: Uuid,
    pub item_id: Uuid,
    pub store_id: i32,
    pub store_name: String,
    pub percentage: Decimal,
    pub min_volume: Decimal,      // Volume mínimo (CX/FD)
    pub physical_volume: Decimal, // Convertido em unidades soltas
}

// Linha pronta para gravar (já validada e convertida)
#[derive(Debug, Clone, PartialEq)]
pub struct NewDistribution {
    pub store_id: i32,
    pub store_name: String,
    pub percentage: Decimal,
    pub min_volume: Decimal,
    pub physical_volume: Decimal,
}

// --- Associado / Loja (diretório externo) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: i32,
    pub name: String,
    pub is_active: bool,
}

// Linha do plano exibida na tela de distribuição
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanRow {
    pub store_id: i32,
    pub store_name: String,
    pub percentage: Decimal,
    pub volume: Decimal,
    pub physical_volume: Decimal,
}

impl From<Distribution> for PlanRow {
    fn from(d: Distribution) -> Self {
        Self {
            store_id: d.store_id,
            store_name: d.store_name,
            percentage: d.percentage,
            volume: d.min_volume,
            physical_volume: d.physical_volume,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributionPlan {
    pub item_id: Uuid,
    pub item_description: String,
    pub negotiated_volume: Decimal,
    pub package_quantity: Decimal,
    // `true` quando as linhas vieram do histórico e ainda não foram gravadas
    pub is_suggestion: bool,
    pub total_volume: Decimal,
    pub rows: Vec<PlanRow>,
}

// Linha usada na exportação: distribuição + dados do item
#[derive(Debug, Clone, FromRow)]
pub struct LedgerLine {
    pub item_id: Uuid,
    pub item_description: String,
    pub unit: crate::models::item::UnitOfMeasure,
    pub package_quantity: Decimal,
    pub store_id: i32,
    pub store_name: String,
    pub percentage: Decimal,
    pub min_volume: Decimal,
    pub physical_volume: Decimal,
}
