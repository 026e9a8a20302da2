// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn create_router(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas de usuário (protegidas)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let business_routes = Router::new()
        .route("/", post(handlers::business::create_business))
        .route("/join", post(handlers::business::join_business))
        .route("/leave", post(handlers::business::leave_business))
        .route("/details", get(handlers::business::get_business_details))
        // Cargos
        .route(
            "/roles",
            get(handlers::rbac::list_roles).post(handlers::rbac::upsert_role),
        )
        .route("/roles/{role_id}", delete(handlers::rbac::delete_role))
        // Equipe
        .route(
            "/staff",
            get(handlers::staff::list_staff).post(handlers::staff::add_staff),
        )
        .route(
            "/staff/{staff_id}",
            put(handlers::staff::update_staff).delete(handlers::staff::remove_staff),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/permissions", get(handlers::rbac::list_permissions))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/business", business_routes)
        .with_state(app_state)
}
