// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Business ---
        handlers::business::create_business,
        handlers::business::join_business,
        handlers::business::leave_business,
        handlers::business::get_business_details,

        // --- Roles ---
        handlers::rbac::list_roles,
        handlers::rbac::upsert_role,
        handlers::rbac::delete_role,
        handlers::rbac::list_permissions,

        // --- Staff ---
        handlers::staff::list_staff,
        handlers::staff::add_staff,
        handlers::staff::update_staff,
        handlers::staff::remove_staff,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::BusinessSnapshot,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Permissões ---
            models::permission::Module,
            models::permission::Action,
            models::permission::Permission,

            // --- Business ---
            models::business::Role,
            models::business::RoleView,
            models::business::Staff,
            models::business::BusinessDetails,
            models::business::MembershipResponse,
            models::business::JoinResponse,

            // --- Payloads ---
            models::business::CreateBusinessPayload,
            models::business::JoinBusinessPayload,
            models::business::UpsertRolePayload,
            models::business::AddStaffPayload,
            models::business::UpdateStaffPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Cadastro e Login"),
        (name = "Users", description = "Usuário autenticado"),
        (name = "Business", description = "Criação, entrada e saída da empresa"),
        (name = "Roles", description = "Cargos e permissões (apenas o dono altera)"),
        (name = "Staff", description = "Equipe da empresa (apenas o dono altera)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
