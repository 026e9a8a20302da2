// src/handlers/staff.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
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
    models::business::{AddStaffPayload, MembershipResponse, NewStaff, Staff, UpdateStaffPayload},
    services::staff_service::StaffUpdate,
};

// GET /api/business/staff
#[utoipa::path(
    get,
    path = "/api/business/staff",
    tag = "Staff",
    responses(
        (status = 200, description = "Equipe da empresa", body = Vec<Staff>),
        (status = 403, description = "Sem permissão staff:read")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_staff(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermStaffRead>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let staff = app_state
        .staff_service
        .list_staff(&user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(staff))
}

// POST /api/business/staff
#[utoipa::path(
    post,
    path = "/api/business/staff",
    tag = "Staff",
    request_body = AddStaffPayload,
    responses(
        (status = 201, description = "Funcionário cadastrado", body = MembershipResponse),
        (status = 403, description = "Apenas o dono"),
        (status = 409, description = "E-mail já na equipe")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_staff(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<AddStaffPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let new = NewStaff {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        salary: payload.salary,
        user_id: None,
    };

    let (business, staff) = app_state
        .staff_service
        .add_staff(&user, new, &payload.role)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((
        StatusCode::CREATED,
        Json(MembershipResponse {
            message: Notice::StaffAdded { staff_id: &staff.staff_id }.text(&locale),
            user: None,
            business: Some(business.details_for(&user)),
        }),
    ))
}

// PUT /api/business/staff/{staff_id}
#[utoipa::path(
    put,
    path = "/api/business/staff/{staff_id}",
    tag = "Staff",
    request_body = UpdateStaffPayload,
    params(("staff_id" = String, Path, description = "Matrícula (ex: ACME12001) ou id interno")),
    responses(
        (status = 200, description = "Funcionário atualizado", body = MembershipResponse),
        (status = 403, description = "Apenas o dono"),
        (status = 404, description = "Funcionário ou cargo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_staff(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(staff_id): Path<String>,
    Json(payload): Json<UpdateStaffPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let update = StaffUpdate {
        role: payload.role,
        salary: payload.salary,
        name: payload.name,
        phone: payload.phone,
    };

    let (business, staff) = app_state
        .staff_service
        .update_staff(&user, &staff_id, update)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(MembershipResponse {
        message: Notice::StaffUpdated { staff_id: &staff.staff_id }.text(&locale),
        user: None,
        business: Some(business.details_for(&user)),
    }))
}

// DELETE /api/business/staff/{staff_id}
#[utoipa::path(
    delete,
    path = "/api/business/staff/{staff_id}",
    tag = "Staff",
    params(("staff_id" = String, Path, description = "Matrícula (ex: ACME12001) ou id interno")),
    responses(
        (status = 200, description = "Funcionário removido", body = MembershipResponse),
        (status = 403, description = "Apenas o dono"),
        (status = 404, description = "Funcionário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_staff(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(staff_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (business, removed) = app_state
        .staff_service
        .remove_staff(&user, &staff_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(MembershipResponse {
        message: Notice::StaffRemoved { staff_id: &removed.staff_id }.text(&locale),
        user: None,
        business: Some(business.details_for(&user)),
    }))
}
