// src/handlers/history.rs

use axum::{extract::State, Json};
use chrono::Local;

use crate::{common::error::AppError, config::AppState, models::history::RefreshSummary};

// Reprocessa a participação histórica do trimestre anterior
#[utoipa::path(
    post,
    path = "/api/history/refresh",
    tag = "Histórico",
    responses(
        (status = 200, description = "Participação por associado regravada", body = RefreshSummary),
        (status = 400, description = "Nenhum dado encontrado no período"),
        (status = 502, description = "Falha no warehouse")
    ),
    security(("api_jwt" = []))
)]
pub async fn refresh_history(State(app_state): State<AppState>) -> Result<Json<RefreshSummary>, AppError> {
    let today = Local::now().date_naive();
    Ok(Json(app_state.history_service.refresh(today).await?))
}
