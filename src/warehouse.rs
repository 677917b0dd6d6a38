// src/warehouse.rs
//
// Porta de entrada para o warehouse analítico. Os serviços dependem só do
// trait; a implementação concreta (ClickHouse) fica em `clickhouse_gateway`.

pub mod clickhouse_gateway;
pub use clickhouse_gateway::{ClickHouseConfig, ClickHouseWarehouse};

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    common::error::AppError,
    models::{
        catalog::{ProductHit, PurchaseRecord, StoreSales, SupplierGroupHit},
        contract::{ContractFilter, ContractHeader, ContractProduct, ContractSummary, ContractSupplier},
    },
};

/// Como o filtro de CNPJ deve ser aplicado na consulta de compras.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplierMembership {
    /// Somente fornecedores da lista (`IN`)
    Within,
    /// Somente fornecedores fora da lista (`NOT IN`)
    Outside,
}

#[derive(Debug, Clone)]
pub struct PurchaseQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub product_codes: Vec<String>,
    pub supplier_tax_ids: Vec<String>,
    pub membership: SupplierMembership,
}

#[async_trait]
pub trait WarehouseGateway: Send + Sync {
    /// CNPJs dos fornecedores que pertencem aos grupos informados.
    async fn supplier_tax_ids(&self, group_codes: &[String]) -> Result<Vec<String>, AppError>;

    /// Compras agregadas por dia/loja/produto/fornecedor.
    async fn purchases(&self, query: &PurchaseQuery) -> Result<Vec<PurchaseRecord>, AppError>;

    /// Vendas sumarizadas por associado no período.
    async fn store_sales(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<StoreSales>, AppError>;

    async fn search_products(&self, term: &str, limit: u32) -> Result<Vec<ProductHit>, AppError>;

    async fn search_supplier_groups(&self, term: &str, limit: u32) -> Result<Vec<SupplierGroupHit>, AppError>;

    async fn count_contracts(&self, filter: &ContractFilter) -> Result<u64, AppError>;

    /// Contratos ordenados pelo nome do subcontrato.
    async fn contracts(&self, filter: &ContractFilter, limit: u32, offset: u64) -> Result<Vec<ContractSummary>, AppError>;

    async fn contract_header(&self, subcontract: i64) -> Result<Option<ContractHeader>, AppError>;

    /// Fornecedores da rede do contrato (só os que têm CNPJ).
    async fn contract_suppliers(&self, subcontract: i64) -> Result<Vec<ContractSupplier>, AppError>;

    async fn contract_products(&self, subcontract: i64, limit: u32) -> Result<Vec<ContractProduct>, AppError>;
}
