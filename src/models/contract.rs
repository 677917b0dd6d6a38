// src/models/contract.rs
//
// Contratos comerciais consultados no warehouse (somente leitura).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

// Filtros da listagem: trechos do nome, sem diferenciar maiúsculas
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractFilter {
    pub subcontract_name: Option<String>,
    pub contract_name: Option<String>,
}

impl ContractFilter {
    /// Apara os termos e descarta os vazios.
    pub fn new(subcontract_name: Option<&str>, contract_name: Option<&str>) -> Self {
        let clean = |raw: Option<&str>| raw.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string);
        Self {
            subcontract_name: clean(subcontract_name),
            contract_name: clean(contract_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractSummary {
    pub subcontract_name: String,
    pub contract_name: String,
    pub contract_number: i64,
    pub contract: i64,
    pub subcontract: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractPage {
    pub items: Vec<ContractSummary>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractHeader {
    pub contract_name: String,
    pub subcontract_name: String,
    // Fração (0.05 = 5%)
    pub discount_rate: Decimal,
    pub fixed_discount: Decimal,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub subcontract: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractSupplier {
    pub corporate_name: String,
    pub trade_name: String,
    pub tax_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractProduct {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractDetail {
    pub contract: ContractHeader,
    pub suppliers: Vec<ContractSupplier>,
    pub products: Vec<ContractProduct>,
}
