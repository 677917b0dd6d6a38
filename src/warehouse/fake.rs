// src/warehouse/fake.rs
//
// Warehouse em memória para os testes: filtra como o ClickHouse faria.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    common::error::AppError,
    models::{
        catalog::{ProductHit, PurchaseRecord, StoreSales, SupplierGroupHit},
        contract::{ContractFilter, ContractHeader, ContractProduct, ContractSummary, ContractSupplier},
    },
    warehouse::{PurchaseQuery, SupplierMembership, WarehouseGateway},
};

#[derive(Default)]
pub struct FakeWarehouse {
    pub tax_ids: Vec<String>,
    pub purchases: Vec<PurchaseRecord>,
    pub contracts: Vec<ContractSummary>,
    pub headers: Vec<ContractHeader>,
    pub suppliers: Vec<ContractSupplier>,
    pub products: Vec<ContractProduct>,
    pub fail: bool,
    pub queries: Mutex<Vec<PurchaseQuery>>,
}

impl FakeWarehouse {
    fn check(&self) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::WarehouseError("timeout".into()));
        }
        Ok(())
    }

    fn matching_contracts(&self, filter: &ContractFilter) -> Vec<ContractSummary> {
        let contains = |value: &str, term: &Option<String>| {
            term.as_ref()
                .map_or(true, |t| value.to_lowercase().contains(&t.to_lowercase()))
        };
        let mut found: Vec<ContractSummary> = self
            .contracts
            .iter()
            .filter(|c| contains(&c.subcontract_name, &filter.subcontract_name))
            .filter(|c| contains(&c.contract_name, &filter.contract_name))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.subcontract_name.cmp(&b.subcontract_name));
        found
    }
}

#[async_trait]
impl WarehouseGateway for FakeWarehouse {
    async fn supplier_tax_ids(&self, _group_codes: &[String]) -> Result<Vec<String>, AppError> {
        self.check()?;
        Ok(self.tax_ids.clone())
    }

    async fn purchases(&self, query: &PurchaseQuery) -> Result<Vec<PurchaseRecord>, AppError> {
        self.check()?;
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }
        Ok(self
            .purchases
            .iter()
            .filter(|p| p.date >= query.start && p.date <= query.end)
            .filter(|p| query.product_codes.contains(&p.product_code))
            .filter(|p| {
                let listed = query.supplier_tax_ids.contains(&p.supplier_tax_id);
                match query.membership {
                    SupplierMembership::Within => listed,
                    SupplierMembership::Outside => !listed,
                }
            })
            .cloned()
            .collect())
    }

    async fn store_sales(&self, _start: NaiveDate, _end: NaiveDate) -> Result<Vec<StoreSales>, AppError> {
        Ok(vec![])
    }

    async fn search_products(&self, _term: &str, _limit: u32) -> Result<Vec<ProductHit>, AppError> {
        Ok(vec![])
    }

    async fn search_supplier_groups(&self, _term: &str, _limit: u32) -> Result<Vec<SupplierGroupHit>, AppError> {
        Ok(vec![])
    }

    async fn count_contracts(&self, filter: &ContractFilter) -> Result<u64, AppError> {
        self.check()?;
        Ok(self.matching_contracts(filter).len() as u64)
    }

    async fn contracts(&self, filter: &ContractFilter, limit: u32, offset: u64) -> Result<Vec<ContractSummary>, AppError> {
        self.check()?;
        Ok(self
            .matching_contracts(filter)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn contract_header(&self, subcontract: i64) -> Result<Option<ContractHeader>, AppError> {
        self.check()?;
        Ok(self.headers.iter().find(|h| h.subcontract == subcontract).cloned())
    }

    async fn contract_suppliers(&self, _subcontract: i64) -> Result<Vec<ContractSupplier>, AppError> {
        self.check()?;
        Ok(self.suppliers.clone())
    }

    async fn contract_products(&self, _subcontract: i64, limit: u32) -> Result<Vec<ContractProduct>, AppError> {
        self.check()?;
        Ok(self.products.iter().take(limit as usize).cloned().collect())
    }
}
