// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::{ApiError, AppError},
    middleware::i18n::Locale,
    models::{
        auth::User,
        permission::{Action, Module},
    },
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    const MODULE: Module;
    const ACTION: Action;
}

/// 2. O Extractor (Guardião). Confere o snapshot do usuário, sem ir ao banco.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(locale) = Locale::from_request_parts(parts, state).await;

        let user = parts
            .extensions
            .get::<User>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;

        if !user.can(T::MODULE, T::ACTION) {
            let message = format!(
                "You need the '{}:{}' permission to perform this action.",
                T::MODULE.as_str(),
                T::ACTION.as_str()
            );
            return Err(AppError::Forbidden(message).to_api_error(&locale));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermStaffRead;
impl PermissionDef for PermStaffRead {
    const MODULE: Module = Module::Staff;
    const ACTION: Action = Action::Read;
}
