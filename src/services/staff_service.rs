// src/services/staff_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::{BusinessStore, UserStore},
    models::{
        auth::User,
        business::{Business, NewStaff, Staff, StaffChanges},
    },
    services::business_service::{load_member_business, load_owned_business},
};

#[derive(Clone)]
pub struct StaffService {
    user_repo: Arc<dyn UserStore>,
    business_repo: Arc<dyn BusinessStore>,
}

/// Alterações pedidas no PUT de funcionário.
#[derive(Debug, Clone, Default)]
pub struct StaffUpdate {
    pub role: Option<String>,
    pub salary: Option<Decimal>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl StaffService {
    pub fn new(user_repo: Arc<dyn UserStore>, business_repo: Arc<dyn BusinessStore>) -> Self {
        Self { user_repo, business_repo }
    }

    pub async fn list_staff(&self, user: &User) -> Result<Vec<Staff>, AppError> {
        let business = load_member_business(self.business_repo.as_ref(), user).await?;
        Ok(business.staff)
    }

    /// Dono cadastra o funcionário. Quando a pessoa entrar com um código de cargo,
    /// cai no caminho de "já é da equipe" e o snapshot dela é preenchido.
    pub async fn add_staff(
        &self,
        user: &User,
        new: NewStaff,
        role: &str,
    ) -> Result<(Business, Staff), AppError> {
        let mut business = load_owned_business(self.business_repo.as_ref(), user).await?;
        let staff = business.add_staff(new, role)?.clone();
        let business = self.business_repo.save(&business).await?;

        tracing::info!(business_id = %business.id, staff_id = %staff.staff_id, "👥 Funcionário cadastrado");
        Ok((business, staff))
    }

    /// Troca o cargo: as permissões viram uma cópia exata do cargo novo.
    /// O usuário afetado vê a mudança no próximo reparo (GET /business/details).
    pub async fn update_staff_role(
        &self,
        user: &User,
        staff_key: &str,
        role: &str,
    ) -> Result<(Business, Staff), AppError> {
        self.update_staff(
            user,
            staff_key,
            StaffUpdate { role: Some(role.to_string()), ..Default::default() },
        )
        .await
    }

    pub async fn update_staff(
        &self,
        user: &User,
        staff_key: &str,
        update: StaffUpdate,
    ) -> Result<(Business, Staff), AppError> {
        let mut business = load_owned_business(self.business_repo.as_ref(), user).await?;

        if let Some(role) = update.role.as_deref().filter(|r| !r.trim().is_empty()) {
            business.assign_role(staff_key, role.trim())?;
        }
        let staff = business
            .update_staff_details(
                staff_key,
                StaffChanges { name: update.name, phone: update.phone, salary: update.salary },
            )?
            .clone();

        let business = self.business_repo.save(&business).await?;

        tracing::info!(
            business_id = %business.id,
            staff_id = %staff.staff_id,
            role = %staff.role,
            "✏️ Funcionário atualizado"
        );
        Ok((business, staff))
    }

    /// Remove da equipe e limpa o snapshot do usuário na hora.
    /// A remoção é o que vale; se a limpeza falhar, o reparo na leitura termina o serviço.
    pub async fn remove_staff(&self, user: &User, staff_key: &str) -> Result<(Business, Staff), AppError> {
        let mut business = load_owned_business(self.business_repo.as_ref(), user).await?;
        let removed = business.remove_staff(staff_key)?;
        let business = self.business_repo.save(&business).await?;

        match self
            .user_repo
            .clear_snapshot_for_business(&removed.email, business.id)
            .await
        {
            Ok(cleared) => tracing::info!(
                business_id = %business.id,
                staff_id = %removed.staff_id,
                snapshot_cleared = cleared,
                "🚪 Funcionário removido"
            ),
            Err(e) => tracing::warn!(
                business_id = %business.id,
                staff_id = %removed.staff_id,
                error = %e,
                "Funcionário removido, mas o snapshot do usuário não foi limpo"
            ),
        }

        Ok((business, removed))
    }
}
