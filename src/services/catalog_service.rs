// src/services/catalog_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    models::catalog::{ProductHit, SupplierGroupHit},
    warehouse::WarehouseGateway,
};

const MIN_TERM_LEN: usize = 3;
const SEARCH_LIMIT: u32 = 50;

pub fn search_term(raw: &str) -> Result<&str, AppError> {
    let term = raw.trim();
    if term.chars().count() < MIN_TERM_LEN {
        return Err(AppError::InvalidInput(format!(
            "Digite ao menos {} caracteres para pesquisar.",
            MIN_TERM_LEN
        )));
    }
    Ok(term)
}

#[derive(Clone)]
pub struct CatalogService {
    warehouse: Arc<dyn WarehouseGateway>,
}

impl CatalogService {
    pub fn new(warehouse: Arc<dyn WarehouseGateway>) -> Self {
        Self { warehouse }
    }

    pub async fn search_products(&self, raw: &str) -> Result<Vec<ProductHit>, AppError> {
        let term = search_term(raw)?;
        self.warehouse.search_products(term, SEARCH_LIMIT).await
    }

    pub async fn search_supplier_groups(&self, raw: &str) -> Result<Vec<SupplierGroupHit>, AppError> {
        let term = search_term(raw)?;
        self.warehouse.search_supplier_groups(term, SEARCH_LIMIT).await
    }
}
