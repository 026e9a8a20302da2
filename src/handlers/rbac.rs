// src/handlers/rbac.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        messages::Notice,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermStaffRead, RequirePermission},
    },
    models::{
        business::{MembershipResponse, RoleView, UpsertRolePayload},
        permission::{Action, Module},
    },
};

// GET /api/business/roles
#[utoipa::path(
    get,
    path = "/api/business/roles",
    tag = "Roles",
    responses(
        (status = 200, description = "Cargos da empresa (códigos só para o dono)", body = Vec<RoleView>),
        (status = 403, description = "Sem permissão staff:read")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermStaffRead>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let roles = app_state
        .rbac_service
        .list_roles(&user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(roles))
}

// POST /api/business/roles  (com `id` edita, sem `id` cria)
#[utoipa::path(
    post,
    path = "/api/business/roles",
    tag = "Roles",
    request_body = UpsertRolePayload,
    responses(
        (status = 200, description = "Cargo salvo", body = MembershipResponse),
        (status = 403, description = "Apenas o dono"),
        (status = 409, description = "Empresa alterada por outra requisição")
    ),
    security(("api_jwt" = []))
)]
pub async fn upsert_role(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<UpsertRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let (business, role) = app_state
        .rbac_service
        .create_or_update_role(&user, payload.id.as_deref(), &payload.role_name, &payload.permissions)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(MembershipResponse {
        message: Notice::RoleSaved { role: &role.role_name }.text(&locale),
        user: None,
        business: Some(business.details_for(&user)),
    }))
}

// DELETE /api/business/roles/{role_id}
#[utoipa::path(
    delete,
    path = "/api/business/roles/{role_id}",
    tag = "Roles",
    params(("role_id" = String, Path, description = "ID do cargo")),
    responses(
        (status = 200, description = "Cargo removido", body = MembershipResponse),
        (status = 403, description = "Apenas o dono"),
        (status = 409, description = "Cargo padrão ou em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_role(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(role_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let business = app_state
        .rbac_service
        .delete_role(&user, &role_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(MembershipResponse {
        message: Notice::RoleDeleted.text(&locale),
        user: None,
        business: Some(business.details_for(&user)),
    }))
}

// GET /api/permissions (Para o frontend saber o que mostrar na tela de criação)
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "Roles",
    responses((status = 200, description = "Módulos e ações disponíveis"))
)]
pub async fn list_permissions() -> impl IntoResponse {
    let modules: Vec<&str> = Module::ALL.iter().map(Module::as_str).collect();
    let actions: Vec<&str> = Action::ALL.iter().map(Action::as_str).collect();
    Json(serde_json::json!({ "modules": modules, "actions": actions }))
}
