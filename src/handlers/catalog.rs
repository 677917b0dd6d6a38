// src/handlers/catalog.rs

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::error::AppError,
    config::AppState,
    models::catalog::{ProductHit, SupplierGroupHit},
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Termo de busca (mínimo 3 caracteres)
    #[serde(default)]
    pub q: String,
}

#[utoipa::path(
    get,
    path = "/api/catalog/products",
    tag = "Catálogo",
    params(SearchQuery),
    responses(
        (status = 200, description = "Produtos por código ou descrição", body = Vec<ProductHit>),
        (status = 400, description = "Termo curto demais")
    ),
    security(("api_jwt" = []))
)]
pub async fn search_products(
    State(app_state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ProductHit>>, AppError> {
    Ok(Json(app_state.catalog_service.search_products(&query.q).await?))
}

#[utoipa::path(
    get,
    path = "/api/catalog/supplier-groups",
    tag = "Catálogo",
    params(SearchQuery),
    responses(
        (status = 200, description = "Grupos de fornecedores por nome", body = Vec<SupplierGroupHit>),
        (status = 400, description = "Termo curto demais")
    ),
    security(("api_jwt" = []))
)]
pub async fn search_supplier_groups(
    State(app_state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SupplierGroupHit>>, AppError> {
    Ok(Json(app_state.catalog_service.search_supplier_groups(&query.q).await?))
}
