// src/handlers/grades.rs

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    db::grade_repo::GradeHeader,
    models::{
        dashboard::GradeDashboard,
        grade::{Grade, GradeDetail, GradeStatus, GradeSummary},
    },
};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierGroupPayload {
    #[validate(length(min = 1, message = "O código do grupo é obrigatório."))]
    #[schema(example = "1043")]
    pub code: String,
    #[validate(length(min = 1, message = "O nome do grupo é obrigatório."))]
    #[schema(example = "MONDELEZ")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GradePayload {
    pub event_id: Uuid,
    pub buyer_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(length(max = 2000, message = "Observações muito longas."))]
    pub notes: Option<String>,
    // Só na edição; a conclusão é exclusiva da finalização
    pub status: Option<GradeStatus>,
    #[validate(length(min = 1, message = "Informe ao menos um grupo de fornecedores."), nested)]
    pub groups: Vec<SupplierGroupPayload>,
}

impl GradePayload {
    fn header(&self) -> GradeHeader<'_> {
        GradeHeader {
            event_id: self.event_id,
            buyer_id: self.buyer_id,
            start_date: self.start_date,
            end_date: self.end_date,
            notes: self.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()),
        }
    }

    fn group_pairs(&self) -> Vec<(String, String)> {
        self.groups.iter().map(|g| (g.code.clone(), g.name.clone())).collect()
    }
}

#[utoipa::path(
    get,
    path = "/api/grades",
    tag = "Grades",
    responses((status = 200, description = "Grades cadastradas", body = Vec<GradeSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_grades(State(app_state): State<AppState>) -> Result<Json<Vec<GradeSummary>>, AppError> {
    Ok(Json(app_state.grade_service.list().await?))
}

#[utoipa::path(
    post,
    path = "/api/grades",
    tag = "Grades",
    request_body = GradePayload,
    responses(
        (status = 201, description = "Grade criada em rascunho", body = Grade),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_grade(
    State(app_state): State<AppState>,
    Json(payload): Json<GradePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let grade = app_state.grade_service
        .create(&payload.header(), &payload.group_pairs())
        .await?;

    Ok((StatusCode::CREATED, Json(grade)))
}

#[utoipa::path(
    get,
    path = "/api/grades/{id}",
    tag = "Grades",
    params(("id" = Uuid, Path, description = "ID da grade")),
    responses(
        (status = 200, description = "Grade com grupos e itens", body = GradeDetail),
        (status = 404, description = "Grade não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_grade(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GradeDetail>, AppError> {
    Ok(Json(app_state.grade_service.get_detail(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/grades/{id}",
    tag = "Grades",
    request_body = GradePayload,
    params(("id" = Uuid, Path, description = "ID da grade")),
    responses(
        (status = 200, description = "Grade atualizada", body = Grade),
        (status = 404, description = "Grade não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_grade(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GradePayload>,
) -> Result<Json<Grade>, AppError> {
    payload.validate()?;

    let grade = app_state.grade_service
        .update(id, &payload.header(), payload.status, &payload.group_pairs())
        .await?;

    Ok(Json(grade))
}

#[utoipa::path(
    delete,
    path = "/api/grades/{id}",
    tag = "Grades",
    params(("id" = Uuid, Path, description = "ID da grade")),
    responses((status = 204, description = "Grade excluída com itens e distribuições")),
    security(("api_jwt" = []))
)]
pub async fn delete_grade(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.grade_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/grades/{id}/finalize",
    tag = "Grades",
    params(("id" = Uuid, Path, description = "ID da grade")),
    responses(
        (status = 200, description = "Grade concluída", body = Grade),
        (status = 422, description = "Grade sem itens ou com itens pendentes de distribuição")
    ),
    security(("api_jwt" = []))
)]
pub async fn finalize_grade(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Grade>, AppError> {
    Ok(Json(app_state.grade_service.finalize(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/grades/{id}/dashboard",
    tag = "Apuração",
    params(("id" = Uuid, Path, description = "ID da grade")),
    responses(
        (status = 200, description = "Meta x realizado da grade", body = GradeDashboard),
        (status = 422, description = "Grade sem SKUs ou sem grupos"),
        (status = 502, description = "Falha no warehouse")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_dashboard(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GradeDashboard>, AppError> {
    Ok(Json(app_state.reconciliation_service.dashboard(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/grades/{id}/export",
    tag = "Apuração",
    params(("id" = Uuid, Path, description = "ID da grade")),
    responses((status = 200, description = "Planilha CSV da distribuição", body = String, content_type = "text/csv")),
    security(("api_jwt" = []))
)]
pub async fn export_grade(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let file = app_state.export_service.export_grade(id).await?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.file_name),
        ),
    ];
    Ok((headers, file.content))
}
