// src/handlers/users.rs
//
// Administração de usuários. A checagem de administrador fica no serviço.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, pagination::lenient_number},
    config::AppState,
    db::user_repo::UserFields,
    middleware::auth::AuthenticatedUser,
    models::auth::{NewUserPayload, UpdateUserPayload, User, UserPage},
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Trecho do nome ou do login
    pub q: Option<String>,
    /// Página (valores não numéricos são ignorados)
    pub page: Option<String>,
    /// 10, 25, 50, 100 ou 200
    pub per_page: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Usuários paginados", body = UserPage),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserPage>, AppError> {
    let page = app_state
        .user_service
        .list(
            &actor,
            query.q.as_deref(),
            lenient_number(query.page.as_deref()),
            lenient_number(query.per_page.as_deref()),
        )
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = NewUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = User),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas administradores"),
        (status = 409, description = "Usuário já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<NewUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let fields = UserFields {
        username: &payload.username,
        name: &payload.name,
        is_buyer: payload.is_buyer,
        is_admin: payload.is_admin,
    };
    let user = app_state.user_service.create(&actor, &fields, &payload.password).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "Usuário atualizado", body = User),
        (status = 403, description = "Apenas administradores"),
        (status = 404, description = "Usuário não encontrado"),
        (status = 409, description = "Login em uso ou alteração do próprio acesso")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<User>, AppError> {
    payload.validate()?;

    let fields = UserFields {
        username: &payload.username,
        name: &payload.name,
        is_buyer: payload.is_buyer,
        is_admin: payload.is_admin,
    };
    let user = app_state
        .user_service
        .update(&actor, id, &fields, payload.password.as_deref())
        .await?;

    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/toggle-status",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Status invertido", body = User),
        (status = 403, description = "Apenas administradores"),
        (status = 409, description = "Não é possível desativar o próprio usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_user_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    Ok(Json(app_state.user_service.toggle_active(&actor, id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 204, description = "Usuário excluído"),
        (status = 403, description = "Apenas administradores"),
        (status = 404, description = "Usuário não encontrado"),
        (status = 409, description = "Não é possível excluir o próprio usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.user_service.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
