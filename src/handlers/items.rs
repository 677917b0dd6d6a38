// src/handlers/items.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    db::item_repo::{ItemFields, NewSku},
    models::{
        distribution::DistributionPlan,
        item::{ItemDetail, UnitOfMeasure},
    },
    services::allocation_service::PlanRowInput,
};

// ---
// Validação Customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

fn default_package_quantity() -> Decimal {
    Decimal::ONE
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkuPayload {
    #[validate(length(min = 1, max = 50, message = "O código do produto é obrigatório."))]
    #[schema(example = "104523")]
    pub product_code: String,
    #[validate(length(min = 1, message = "A descrição do produto é obrigatória."))]
    pub product_description: String,
    pub package: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    #[validate(length(min = 1, max = 255, message = "A descrição é obrigatória."))]
    pub description: String,
    pub unit: UnitOfMeasure,

    #[serde(default = "default_package_quantity")]
    #[validate(custom(function = "validate_positive"))]
    pub package_quantity: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub negotiated_volume: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub gross_unit_cost: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub net_unit_cost: Decimal,

    #[serde(default)] // Se o JSON não tiver esse campo, assume 0
    #[validate(custom(function = "validate_not_negative"))]
    pub sell_in_allowance: Decimal,

    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub invoice_discount_pct: Decimal,

    #[serde(default)]
    #[validate(nested)]
    pub skus: Vec<SkuPayload>,
}

impl ItemPayload {
    fn fields(&self) -> ItemFields<'_> {
        ItemFields {
            description: self.description.trim(),
            unit: self.unit,
            package_quantity: self.package_quantity,
            negotiated_volume: self.negotiated_volume,
            gross_unit_cost: self.gross_unit_cost,
            net_unit_cost: self.net_unit_cost,
            sell_in_allowance: self.sell_in_allowance,
            invoice_discount_pct: self.invoice_discount_pct,
        }
    }

    fn new_skus(&self) -> Vec<NewSku<'_>> {
        self.skus
            .iter()
            .map(|s| NewSku {
                product_code: s.product_code.trim(),
                product_description: s.product_description.trim(),
                package: s.package.as_deref().map(str::trim).filter(|p| !p.is_empty()),
            })
            .collect()
    }
}

#[utoipa::path(
    post,
    path = "/api/grades/{id}/items",
    tag = "Itens",
    request_body = ItemPayload,
    params(("id" = Uuid, Path, description = "ID da grade")),
    responses(
        (status = 201, description = "Item criado com os SKUs", body = ItemDetail),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Grade não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_item(
    State(app_state): State<AppState>,
    Path(grade_id): Path<Uuid>,
    Json(payload): Json<ItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state.item_service
        .create(grade_id, &payload.fields(), &payload.new_skus())
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    get,
    path = "/api/items/{id}",
    tag = "Itens",
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Item com SKUs", body = ItemDetail),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_item(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ItemDetail>, AppError> {
    Ok(Json(app_state.item_service.get_detail(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/items/{id}",
    tag = "Itens",
    request_body = ItemPayload,
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Item atualizado (SKUs substituídos)", body = ItemDetail),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ItemPayload>,
) -> Result<Json<ItemDetail>, AppError> {
    payload.validate()?;

    let item = app_state.item_service
        .update(id, &payload.fields(), &payload.new_skus())
        .await?;

    Ok(Json(item))
}

#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    tag = "Itens",
    params(("id" = Uuid, Path, description = "ID do item")),
    responses((status = 204, description = "Item excluído")),
    security(("api_jwt" = []))
)]
pub async fn delete_item(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.item_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
//  DISTRIBUIÇÃO POR ASSOCIADO
// =========================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DistributionQuery {
    /// `true` descarta o que foi gravado e recalcula a sugestão
    #[serde(default)]
    pub reset: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveDistributionPayload {
    pub rows: Vec<PlanRowInput>,
}

#[utoipa::path(
    get,
    path = "/api/items/{id}/distribution",
    tag = "Distribuição",
    params(("id" = Uuid, Path, description = "ID do item"), DistributionQuery),
    responses(
        (status = 200, description = "Distribuição gravada ou sugestão pelo histórico", body = DistributionPlan),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_distribution(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DistributionQuery>,
) -> Result<Json<DistributionPlan>, AppError> {
    let plan = app_state.allocation_service.get_distribution_plan(id, query.reset).await?;
    Ok(Json(plan))
}

#[utoipa::path(
    put,
    path = "/api/items/{id}/distribution",
    tag = "Distribuição",
    request_body = SaveDistributionPayload,
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Distribuição substituída", body = DistributionPlan),
        (status = 400, description = "Número inválido ou associado repetido")
    ),
    security(("api_jwt" = []))
)]
pub async fn save_distribution(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SaveDistributionPayload>,
) -> Result<Json<DistributionPlan>, AppError> {
    let plan = app_state.allocation_service.save_distribution_plan(id, &payload.rows).await?;
    Ok(Json(plan))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_defaults_are_applied() {
        let payload: ItemPayload = serde_json::from_value(json!({
            "description": "Oreo",
            "unit": "CX",
            "negotiatedVolume": 1000,
            "grossUnitCost": 10,
            "netUnitCost": 9
        }))
        .unwrap();

        assert_eq!(payload.package_quantity, Decimal::ONE);
        assert_eq!(payload.sell_in_allowance, Decimal::ZERO);
        assert!(payload.skus.is_empty());
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn negative_volume_fails_validation() {
        let payload: ItemPayload = serde_json::from_value(json!({
            "description": "Oreo",
            "unit": "UN",
            "packageQuantity": 0,
            "negotiatedVolume": -5,
            "grossUnitCost": 10,
            "netUnitCost": 9
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("negotiated_volume"));
        assert!(fields.contains_key("package_quantity"));
    }

    #[test]
    fn distribution_rows_accept_numbers_and_strings() {
        let payload: SaveDistributionPayload = serde_json::from_value(json!({
            "rows": [
                { "storeId": 1, "storeName": "Loja A", "percentage": 60, "volume": "600" },
                { "storeId": 2, "storeName": "Loja B", "percentage": "40,5", "volume": "" }
            ]
        }))
        .unwrap();

        assert_eq!(payload.rows.len(), 2);
        assert_eq!(payload.rows[1].store_id, 2);
    }
}
