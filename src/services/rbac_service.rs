// src/services/rbac_service.rs

use std::sync::Arc;

use crate::{
    common::{
        codes::{self, MAX_CODE_ATTEMPTS},
        error::AppError,
    },
    db::BusinessStore,
    models::{
        auth::User,
        business::{Business, Role, RoleView},
        permission::Permission,
    },
    services::business_service::{load_member_business, load_owned_business},
};

/// Gera um código de cargo inédito na empresa e no banco inteiro.
pub(crate) async fn mint_role_code(
    business_repo: &dyn BusinessStore,
    business: &Business,
    role_name: &str,
) -> Result<String, AppError> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = codes::generate_role_code(&business.business_code, role_name);
        if !business.has_role_code(&code) && !business_repo.role_code_exists(&code).await? {
            return Ok(code);
        }
        tracing::debug!(code = %code, "Código de cargo já em uso, gerando outro");
    }

    Err(AppError::Conflict(format!(
        "Could not generate a unique role code for '{}'. Please retry.",
        role_name
    )))
}

#[derive(Clone)]
pub struct RbacService {
    business_repo: Arc<dyn BusinessStore>,
}

impl RbacService {
    pub fn new(business_repo: Arc<dyn BusinessStore>) -> Self {
        Self { business_repo }
    }

    pub async fn list_roles(&self, user: &User) -> Result<Vec<RoleView>, AppError> {
        let business = load_member_business(self.business_repo.as_ref(), user).await?;
        Ok(business.details_for(user).roles)
    }

    /// Com `id`: edita o cargo no lugar (o código não muda).
    /// Sem `id`: cria um cargo novo com código próprio.
    pub async fn create_or_update_role(
        &self,
        user: &User,
        role_id: Option<&str>,
        role_name: &str,
        permissions: &[Permission],
    ) -> Result<(Business, Role), AppError> {
        let mut business = load_owned_business(self.business_repo.as_ref(), user).await?;

        let role = match role_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => business.update_role(id, role_name, permissions)?.clone(),
            None => {
                let role_code = mint_role_code(self.business_repo.as_ref(), &business, role_name).await?;
                business.add_role(role_name, permissions, role_code, false)?.clone()
            }
        };

        let business = self.business_repo.save(&business).await?;

        tracing::info!(
            business_id = %business.id,
            role_id = %role.id,
            role_version = role.version,
            "🛡️ Cargo salvo"
        );

        Ok((business, role))
    }

    pub async fn delete_role(&self, user: &User, role_id: &str) -> Result<Business, AppError> {
        let mut business = load_owned_business(self.business_repo.as_ref(), user).await?;
        let removed = business.remove_role(role_id)?;
        let business = self.business_repo.save(&business).await?;

        tracing::info!(business_id = %business.id, role = %removed.role_name, "🗑️ Cargo removido");
        Ok(business)
    }
}
