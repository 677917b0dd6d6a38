// src/handlers/contracts.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::{error::AppError, pagination::lenient_number},
    config::AppState,
    models::contract::{ContractDetail, ContractFilter, ContractPage},
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ContractListQuery {
    /// Trecho do nome do subcontrato
    pub subcontract_name: Option<String>,
    /// Trecho do nome do contrato
    pub contract_name: Option<String>,
    pub page: Option<String>,
    /// 10, 25, 50, 100 ou 200 (padrão 25)
    pub per_page: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/contracts",
    tag = "Contratos",
    params(ContractListQuery),
    responses(
        (status = 200, description = "Contratos paginados", body = ContractPage),
        (status = 502, description = "Falha no warehouse")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_contracts(
    State(app_state): State<AppState>,
    Query(query): Query<ContractListQuery>,
) -> Result<Json<ContractPage>, AppError> {
    let filter = ContractFilter::new(query.subcontract_name.as_deref(), query.contract_name.as_deref());
    let page = app_state
        .contract_service
        .list(
            &filter,
            lenient_number(query.page.as_deref()),
            lenient_number(query.per_page.as_deref()),
        )
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/contracts/{subcontract}",
    tag = "Contratos",
    params(("subcontract" = i64, Path, description = "Número do subcontrato")),
    responses(
        (status = 200, description = "Contrato com fornecedores e produtos", body = ContractDetail),
        (status = 404, description = "Contrato não encontrado"),
        (status = 502, description = "Falha no warehouse")
    ),
    security(("api_jwt" = []))
)]
pub async fn contract_detail(
    State(app_state): State<AppState>,
    Path(subcontract): Path<i64>,
) -> Result<Json<ContractDetail>, AppError> {
    Ok(Json(app_state.contract_service.detail(subcontract).await?))
}
