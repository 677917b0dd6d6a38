// src/handlers/events.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{common::error::AppError, config::AppState, models::event::Event};

// Criação e edição usam o mesmo corpo
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[validate(length(min = 1, max = 200, message = "A descrição é obrigatória (até 200 caracteres)."))]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[utoipa::path(
    get,
    path = "/api/events",
    tag = "Eventos",
    responses((status = 200, description = "Eventos cadastrados", body = Vec<Event>)),
    security(("api_jwt" = []))
)]
pub async fn list_events(State(app_state): State<AppState>) -> Result<Json<Vec<Event>>, AppError> {
    Ok(Json(app_state.event_service.list().await?))
}

#[utoipa::path(
    post,
    path = "/api/events",
    tag = "Eventos",
    request_body = EventPayload,
    responses(
        (status = 201, description = "Evento criado", body = Event),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_event(
    State(app_state): State<AppState>,
    Json(payload): Json<EventPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let event = app_state.event_service
        .create(&payload.description, payload.start_date, payload.end_date)
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

#[utoipa::path(
    put,
    path = "/api/events/{id}",
    tag = "Eventos",
    request_body = EventPayload,
    params(("id" = Uuid, Path, description = "ID do evento")),
    responses(
        (status = 200, description = "Evento atualizado", body = Event),
        (status = 404, description = "Evento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_event(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EventPayload>,
) -> Result<Json<Event>, AppError> {
    payload.validate()?;

    let event = app_state.event_service
        .update(id, &payload.description, payload.start_date, payload.end_date)
        .await?;

    Ok(Json(event))
}

#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    tag = "Eventos",
    params(("id" = Uuid, Path, description = "ID do evento")),
    responses(
        (status = 204, description = "Evento excluído"),
        (status = 409, description = "Evento com grades vinculadas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_event(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.event_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
