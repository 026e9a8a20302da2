// src/handlers/business.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        messages::Notice,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::business::{
        CreateBusinessPayload, JoinBusinessPayload, JoinOutcome, JoinResponse, MembershipResponse,
    },
};

// POST /api/business
#[utoipa::path(
    post,
    path = "/api/business",
    tag = "Business",
    request_body = CreateBusinessPayload,
    responses(
        (status = 201, description = "Empresa criada; o usuário virou dono", body = MembershipResponse),
        (status = 409, description = "Usuário já tem empresa ou código em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_business(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateBusinessPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let (business, user) = app_state
        .business_service
        .create_business(&user, &payload.business_name, payload.business_code.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let details = business.details_for(&user);
    Ok((
        StatusCode::CREATED,
        Json(MembershipResponse {
            message: Notice::BusinessCreated { business: &business.business_name }.text(&locale),
            user: Some(user),
            business: Some(details),
        }),
    ))
}

// POST /api/business/join
#[utoipa::path(
    post,
    path = "/api/business/join",
    tag = "Business",
    request_body = JoinBusinessPayload,
    responses(
        (status = 200, description = "Entrou na empresa (ou permissões atualizadas)", body = JoinResponse),
        (status = 404, description = "Código de cargo inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn join_business(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<JoinBusinessPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let result = app_state
        .business_service
        .join_business(&user, &payload.role_code, payload.name.as_deref(), &payload.phone)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let already_member = result.outcome == JoinOutcome::Refreshed;
    let message = if already_member {
        Notice::AlreadyMember.text(&locale)
    } else {
        Notice::Joined {
            business: &result.business.business_name,
            role: &result.role.role_name,
        }
        .text(&locale)
    };

    Ok(Json(JoinResponse {
        message,
        already_member,
        staff_id: result.staff.staff_id.clone(),
        role: result.role.view(false),
        business: result.business.details_for(&result.user),
        user: result.user,
    }))
}

// POST /api/business/leave
#[utoipa::path(
    post,
    path = "/api/business/leave",
    tag = "Business",
    responses(
        (status = 200, description = "Vínculo removido", body = MembershipResponse),
        (status = 400, description = "Dono não pode sair / usuário sem empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn leave_business(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .business_service
        .leave_business(&user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(MembershipResponse {
        message: Notice::LeftBusiness.text(&locale),
        user: Some(user),
        business: None,
    }))
}

// GET /api/business/details
#[utoipa::path(
    get,
    path = "/api/business/details",
    tag = "Business",
    responses(
        (status = 200, description = "Empresa atual com o snapshot do usuário já reparado", body = MembershipResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_business_details(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let (user, business) = app_state
        .business_service
        .business_details(&user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let details = business.map(|b| b.details_for(&user));
    let message = if details.is_some() {
        Notice::DetailsLoaded
    } else {
        Notice::NoBusiness
    };

    Ok(Json(MembershipResponse {
        message: message.text(&locale),
        user: Some(user),
        business: details,
    }))
}
