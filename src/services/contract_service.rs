// src/services/contract_service.rs
//
// Consulta de contratos comerciais no warehouse (somente leitura).

use std::sync::Arc;

use crate::{
    common::{error::AppError, pagination::page_window},
    models::contract::{ContractDetail, ContractFilter, ContractPage},
    warehouse::WarehouseGateway,
};

const CONTRACTS_PER_PAGE: u32 = 25;
const DETAIL_PRODUCTS_LIMIT: u32 = 10;

#[derive(Clone)]
pub struct ContractService {
    warehouse: Arc<dyn WarehouseGateway>,
}

impl ContractService {
    pub fn new(warehouse: Arc<dyn WarehouseGateway>) -> Self {
        Self { warehouse }
    }

    pub async fn list(
        &self,
        filter: &ContractFilter,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Result<ContractPage, AppError> {
        let total = self.warehouse.count_contracts(filter).await?;
        let window = page_window(total, page, per_page, CONTRACTS_PER_PAGE);

        let items = if total == 0 {
            Vec::new()
        } else {
            self.warehouse.contracts(filter, window.per_page, window.offset).await?
        };

        Ok(ContractPage {
            items,
            total,
            page: window.page,
            per_page: window.per_page,
            total_pages: window.total_pages,
        })
    }

    /// Cabeçalho, fornecedores e os primeiros produtos do subcontrato.
    pub async fn detail(&self, subcontract: i64) -> Result<ContractDetail, AppError> {
        let contract = self
            .warehouse
            .contract_header(subcontract)
            .await?
            .ok_or(AppError::NotFound("Contrato"))?;

        let suppliers = self.warehouse.contract_suppliers(subcontract).await?;
        let products = self.warehouse.contract_products(subcontract, DETAIL_PRODUCTS_LIMIT).await?;

        Ok(ContractDetail { contract, suppliers, products })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::contract::{ContractHeader, ContractProduct, ContractSummary},
        warehouse::fake::FakeWarehouse,
    };
    use rust_decimal::Decimal;

    fn summary(subcontract: i64, sub_name: &str, name: &str) -> ContractSummary {
        ContractSummary {
            subcontract_name: sub_name.into(),
            contract_name: name.into(),
            contract_number: 900 + subcontract,
            contract: 10,
            subcontract,
        }
    }

    fn service(warehouse: FakeWarehouse) -> ContractService {
        ContractService::new(Arc::new(warehouse))
    }

    #[tokio::test]
    async fn list_filters_and_clamps_the_page() {
        let contracts = (1..=30).map(|n| summary(n, &format!("SUB {:02}", n), "Bonificação Mondelez")).collect();
        let service = service(FakeWarehouse { contracts, ..Default::default() });

        let page = service.list(&ContractFilter::default(), Some(5), Some(25)).await.unwrap();
        assert_eq!((page.total, page.page, page.total_pages), (30, 2, 2));
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items[0].subcontract_name, "SUB 26");

        let filter = ContractFilter::new(Some(" sub 0 "), Some("mondelez"));
        let page = service.list(&filter, None, Some(7)).await.unwrap();
        assert_eq!(page.per_page, 25);
        assert_eq!(page.total, 9);
    }

    #[tokio::test]
    async fn empty_list_skips_the_fetch() {
        let service = service(FakeWarehouse::default());
        let page = service.list(&ContractFilter::new(Some("nada"), None), None, None).await.unwrap();
        assert_eq!((page.total, page.page, page.total_pages), (0, 1, 1));
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn detail_brings_products_capped_at_ten() {
        let header = ContractHeader {
            contract_name: "Bonificação".into(),
            subcontract_name: "SUB 01".into(),
            discount_rate: Decimal::new(5, 2),
            fixed_discount: Decimal::ZERO,
            valid_from: None,
            valid_until: None,
            subcontract: 1,
        };
        let products = (0..15)
            .map(|n| ContractProduct { code: n.to_string(), description: format!("Produto {}", n) })
            .collect();
        let service = service(FakeWarehouse { headers: vec![header], products, ..Default::default() });

        let detail = service.detail(1).await.unwrap();
        assert_eq!(detail.contract.subcontract_name, "SUB 01");
        assert_eq!(detail.products.len(), 10);

        assert!(matches!(service.detail(2).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn warehouse_outage_is_reported() {
        let service = service(FakeWarehouse { fail: true, ..Default::default() });
        assert!(matches!(
            service.list(&ContractFilter::default(), None, None).await,
            Err(AppError::WarehouseError(_))
        ));
    }
}
